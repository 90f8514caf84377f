use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::geom::{Bound, lng_lat_to_mercator, mercator_to_lng_lat};

/// Highest zoom whose tile indices still fit comfortably in `u32` math.
pub(crate) const MAX_ZOOM: u8 = 24;

/// A tile in the XYZ scheme: row 0 is the northernmost row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Key used for cache and output file names, `"{z}_{x}_{y}"`.
    pub fn key(&self) -> String {
        format!("{}_{}_{}", self.z, self.x, self.y)
    }

    /// Number of tiles along one axis at this zoom.
    pub fn dimension(&self) -> u32 {
        1u32 << self.z
    }

    pub fn is_valid(&self) -> bool {
        self.z <= MAX_ZOOM && self.x < self.dimension() && self.y < self.dimension()
    }

    /// Side length of the tile in normalized mercator units.
    pub fn span(&self) -> f64 {
        1.0 / self.dimension() as f64
    }

    pub fn parent(&self) -> Option<TileCoord> {
        (self.z > 0).then(|| TileCoord::new(self.z - 1, self.x / 2, self.y / 2))
    }

    /// The four children, ordered top-left, top-right, bottom-left, bottom-right.
    pub fn children(&self) -> [TileCoord; 4] {
        let (z, x, y) = (self.z + 1, self.x * 2, self.y * 2);
        [
            TileCoord::new(z, x, y),
            TileCoord::new(z, x + 1, y),
            TileCoord::new(z, x, y + 1),
            TileCoord::new(z, x + 1, y + 1),
        ]
    }

    /// The 4x4 block of next-zoom tiles centred on this tile, indexed `[row][col]`.
    ///
    /// Rows and columns run from `2y - 1` to `2y + 2` (and likewise for x); the
    /// middle 2x2 are the [`children`](Self::children). Cells that fall outside
    /// the world are `None`.
    pub fn neighborhood(&self) -> [[Option<TileCoord>; 4]; 4] {
        let z = self.z + 1;
        let n = 1i64 << z;
        let mut cells = [[None; 4]; 4];
        for (row, cells_row) in cells.iter_mut().enumerate() {
            let y = 2 * self.y as i64 - 1 + row as i64;
            for (col, cell) in cells_row.iter_mut().enumerate() {
                let x = 2 * self.x as i64 - 1 + col as i64;
                if (0..n).contains(&x) && (0..n).contains(&y) {
                    *cell = Some(TileCoord::new(z, x as u32, y as u32));
                }
            }
        }
        cells
    }

    /// Which sides of this tile face the edge of the world.
    pub fn world_edges(&self) -> crate::raster::Sides {
        let last = self.dimension() - 1;
        crate::raster::Sides {
            left: self.x == 0,
            right: self.x == last,
            top: self.y == 0,
            bottom: self.y == last,
        }
    }

    /// Row index in the TMS scheme used by MBTiles (row 0 is southernmost).
    pub fn tms_row(&self) -> u32 {
        self.dimension() - 1 - self.y
    }

    /// Mercator extent of the tile, grown on every side by `padding` tile widths.
    pub fn mercator_bound(&self, padding: f64) -> Bound {
        let span = self.span();
        Bound::new(
            (self.x as f64 - padding) * span,
            (self.y as f64 - padding) * span,
            (self.x as f64 + 1.0 + padding) * span,
            (self.y as f64 + 1.0 + padding) * span,
        )
    }

    /// Geographic extent of the tile, grown on every side by `padding` tile widths.
    pub fn bound(&self, padding: f64) -> Bound {
        let mercator = self.mercator_bound(padding);
        // Mercator y points south, so the top edge carries the max latitude.
        let south_west = mercator_to_lng_lat(Coord { x: mercator.min_x, y: mercator.max_y });
        let north_east = mercator_to_lng_lat(Coord { x: mercator.max_x, y: mercator.min_y });
        Bound::new(south_west.x, south_west.y, north_east.x, north_east.y)
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// All tiles at `zoom` whose extent meets `bound`, in row-major order.
pub fn tile_list(bound: &Bound, zoom: u8) -> Vec<TileCoord> {
    if bound.is_empty() {
        return Vec::new();
    }
    let n = 1i64 << zoom;
    let top_left = lng_lat_to_mercator(Coord { x: bound.min_x, y: bound.max_y });
    let bottom_right = lng_lat_to_mercator(Coord { x: bound.max_x, y: bound.min_y });
    let index = |v: f64| ((v * n as f64).floor() as i64).clamp(0, n - 1) as u32;

    let (x0, x1) = (index(top_left.x), index(bottom_right.x));
    let (y0, y1) = (index(top_left.y), index(bottom_right.y));
    let mut tiles = Vec::with_capacity(((x1 - x0 + 1) * (y1 - y0 + 1)) as usize);
    for y in y0..=y1 {
        for x in x0..=x1 {
            tiles.push(TileCoord::new(zoom, x, y));
        }
    }
    tiles
}

/// [`tile_list`] for every zoom from `max_zoom` down to `min_zoom`.
pub fn tile_list_range(bound: &Bound, min_zoom: u8, max_zoom: u8) -> Vec<(u8, Vec<TileCoord>)> {
    (min_zoom..=max_zoom).rev().map(|zoom| (zoom, tile_list(bound, zoom))).collect()
}

/// Pixel coordinates of one tile's raster canvas.
///
/// The canvas is `size + 2 * padding` pixels wide; pixel `(padding, padding)` is
/// the tile's north-west corner.
#[derive(Debug, Clone, Copy)]
pub struct PixelSpace {
    coord: TileCoord,
    size: f64,
    padding: f64,
}

impl PixelSpace {
    pub fn new(coord: TileCoord, size: usize, padding: usize) -> Self {
        Self { coord, size: size as f64, padding: padding as f64 }
    }

    pub fn to_pixel(&self, lng_lat: Coord<f64>) -> Coord<f64> {
        let m = lng_lat_to_mercator(lng_lat);
        let scale = self.size * self.coord.dimension() as f64;
        Coord {
            x: (m.x * scale - self.coord.x as f64 * self.size) + self.padding,
            y: (m.y * scale - self.coord.y as f64 * self.size) + self.padding,
        }
    }

    pub fn to_lng_lat(&self, pixel: Coord<f64>) -> Coord<f64> {
        let span = self.coord.span();
        mercator_to_lng_lat(Coord {
            x: (self.coord.x as f64 + (pixel.x - self.padding) / self.size) * span,
            y: (self.coord.y as f64 + (pixel.y - self.padding) / self.size) * span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{PixelSpace, TileCoord, tile_list, tile_list_range};
    use crate::geom::{Bound, lng_lat_to_mercator};
    use geo::Coord;

    #[test]
    fn tile_bound_reprojects_to_tile_square() {
        for coord in [TileCoord::new(0, 0, 0), TileCoord::new(5, 17, 9), TileCoord::new(12, 2200, 1300)] {
            let bound = coord.bound(0.0);
            let n = coord.dimension() as f64;
            let nw = lng_lat_to_mercator(Coord { x: bound.min_x, y: bound.max_y });
            let se = lng_lat_to_mercator(Coord { x: bound.max_x, y: bound.min_y });
            assert!((nw.x * n - coord.x as f64).abs() < 1e-6);
            assert!((nw.y * n - coord.y as f64).abs() < 1e-6);
            assert!((se.x * n - (coord.x + 1) as f64).abs() < 1e-6);
            assert!((se.y * n - (coord.y + 1) as f64).abs() < 1e-6);
        }
    }

    #[test]
    fn padding_grows_bound() {
        let coord = TileCoord::new(6, 30, 20);
        let plain = coord.bound(0.0);
        let padded = coord.bound(128.0 / 4096.0);
        assert!(padded.min_x < plain.min_x && padded.max_x > plain.max_x);
        assert!(padded.min_y < plain.min_y && padded.max_y > plain.max_y);
    }

    #[test]
    fn children_and_parent_agree() {
        let coord = TileCoord::new(3, 5, 2);
        let children = coord.children();
        assert_eq!(children[0], TileCoord::new(4, 10, 4));
        assert_eq!(children[3], TileCoord::new(4, 11, 5));
        for child in children {
            assert_eq!(child.parent(), Some(coord));
        }
        assert_eq!(TileCoord::new(0, 0, 0).parent(), None);
    }

    #[test]
    fn neighborhood_centres_children_and_drops_outside_cells() {
        let cells = TileCoord::new(2, 1, 1).neighborhood();
        assert_eq!(cells[1][1], Some(TileCoord::new(3, 2, 2)));
        assert_eq!(cells[2][2], Some(TileCoord::new(3, 3, 3)));
        assert_eq!(cells[0][0], Some(TileCoord::new(3, 1, 1)));

        let corner = TileCoord::new(1, 0, 0).neighborhood();
        assert!(corner[0].iter().all(Option::is_none));
        assert!(corner.iter().all(|row| row[0].is_none()));
        assert_eq!(corner[3][3], Some(TileCoord::new(2, 2, 2)));
    }

    #[test]
    fn tms_row_flips_y() {
        assert_eq!(TileCoord::new(3, 0, 0).tms_row(), 7);
        assert_eq!(TileCoord::new(3, 0, 7).tms_row(), 0);
    }

    #[test]
    fn tile_list_covers_bound() {
        let bound = Bound::new(-10.0, -10.0, 10.0, 10.0);
        let tiles = tile_list(&bound, 1);
        assert_eq!(tiles.len(), 4);
        assert_eq!(tiles[0], TileCoord::new(1, 0, 0));
        assert_eq!(tiles[1], TileCoord::new(1, 1, 0));

        let small = Bound::new(8.5, 47.3, 8.6, 47.4);
        let tiles = tile_list(&small, 10);
        assert!(!tiles.is_empty());
        for tile in &tiles {
            assert!(tile.bound(0.0).intersects(&small));
        }
    }

    #[test]
    fn tile_list_clamps_polar_bounds() {
        let world = Bound::new(-180.0, -90.0, 180.0, 90.0);
        assert_eq!(tile_list(&world, 2).len(), 16);
        assert!(tile_list(&Bound::empty(), 4).is_empty());
    }

    #[test]
    fn tile_list_range_runs_top_down() {
        let bound = Bound::new(1.0, 1.0, 2.0, 2.0);
        let zooms: Vec<u8> = tile_list_range(&bound, 2, 5).into_iter().map(|(z, _)| z).collect();
        assert_eq!(zooms, vec![5, 4, 3, 2]);
    }

    #[test]
    fn pixel_space_round_trips_and_anchors_padding() {
        let coord = TileCoord::new(10, 536, 358);
        let space = PixelSpace::new(coord, 1024, 32);
        let nw = coord.bound(0.0);
        let corner = space.to_pixel(Coord { x: nw.min_x, y: nw.max_y });
        assert!((corner.x - 32.0).abs() < 1e-6 && (corner.y - 32.0).abs() < 1e-6);

        let pixel = Coord { x: 400.25, y: 77.5 };
        let back = space.to_pixel(space.to_lng_lat(pixel));
        assert!((back.x - pixel.x).abs() < 1e-6 && (back.y - pixel.y).abs() < 1e-6);
    }
}
