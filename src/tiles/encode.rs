use std::io::Write;

use anyhow::{Context, Result};
use flate2::Compression as Flate2Compression;
use flate2::write::GzEncoder;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use mvt::{GeomEncoder, GeomType, Tile};

use crate::geom::{PixelSpace, TileCoord, lng_lat_to_mercator};
use crate::tileset::{EXTENT, Settings};

/// Name of the single layer in every tile.
pub const LAYER_NAME: &str = "polygons";

/// Geometry may reach this far past the tile edge, in extent units.
const BUFFER: f64 = 64.0;

/// Map generalized polygons from canvas pixels back to `(lng, lat)`.
pub fn tile_output(polygons: &[Polygon<f64>], coord: TileCoord, settings: &Settings) -> MultiPolygon<f64> {
    let space = PixelSpace::new(coord, settings.raster_size as usize, settings.padding_pixels());
    let unproject = |ring: &LineString<f64>| -> LineString<f64> {
        ring.coords().map(|c| space.to_lng_lat(*c)).collect()
    };
    polygons
        .iter()
        .map(|polygon| {
            Polygon::new(
                unproject(polygon.exterior()),
                polygon.interiors().iter().map(unproject).collect(),
            )
        })
        .collect()
}

/// Position of `lng_lat` in `coord`'s tile units. Points off the tile land
/// outside `0..extent`.
fn world_to_tile_coords(lng_lat: Coord<f64>, coord: TileCoord, extent: f64) -> (f64, f64) {
    let m = lng_lat_to_mercator(lng_lat);
    let n = coord.dimension() as f64;
    ((m.x * n - coord.x as f64) * extent, (m.y * n - coord.y as f64) * extent)
}

/// Cut a ring down to the tile square grown by `buffer` on every side.
fn clip_ring_to_tile(ring: &[(f64, f64)], extent: f64, buffer: f64) -> Vec<(f64, f64)> {
    let (low, high) = (-buffer, extent + buffer);
    [(Axis::X, low, false), (Axis::X, high, true), (Axis::Y, low, false), (Axis::Y, high, true)]
        .into_iter()
        .fold(ring.to_vec(), |ring, (axis, bound, keep_below)| clip_half_plane(&ring, axis, bound, keep_below))
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn of(self, p: (f64, f64)) -> f64 {
        match self {
            Axis::X => p.0,
            Axis::Y => p.1,
        }
    }
}

/// Keep the part of `ring` on one side of the line `axis = bound`, walking
/// each edge once and adding a vertex wherever an edge crosses the line.
fn clip_half_plane(ring: &[(f64, f64)], axis: Axis, bound: f64, keep_below: bool) -> Vec<(f64, f64)> {
    let kept = |p: (f64, f64)| if keep_below { axis.of(p) <= bound } else { axis.of(p) >= bound };
    let crossing = |a: (f64, f64), b: (f64, f64)| {
        let t = (bound - axis.of(a)) / (axis.of(b) - axis.of(a));
        match axis {
            Axis::X => (bound, a.1 + t * (b.1 - a.1)),
            Axis::Y => (a.0 + t * (b.0 - a.0), bound),
        }
    };

    let mut output = Vec::with_capacity(ring.len());
    for (i, &a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        match (kept(a), kept(b)) {
            (true, true) => output.push(b),
            (true, false) => output.push(crossing(a, b)),
            (false, true) => output.extend([crossing(a, b), b]),
            (false, false) => {}
        }
    }
    output
}

/// Signed area of a ring. In tile coordinates (y down) positive means clockwise.
fn ring_signed_area(ring: &[(f64, f64)]) -> f64 {
    let n = ring.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += ring[i].0 * ring[j].1 - ring[j].0 * ring[i].1;
    }
    area / 2.0
}

/// Remove repeated points, the closing duplicate and A-B-A backtracks.
/// Rings left with fewer than 3 points, or with no area, come back empty.
fn clean_ring(ring: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    let mut cleaned: Vec<(f64, f64)> = Vec::with_capacity(ring.len());
    for point in ring {
        if cleaned.last() == Some(&point) {
            continue;
        }
        if cleaned.len() >= 2 && cleaned[cleaned.len() - 2] == point {
            cleaned.pop();
            continue;
        }
        cleaned.push(point);
    }
    while cleaned.len() > 1 && cleaned.first() == cleaned.last() {
        cleaned.pop();
    }
    if cleaned.len() < 3 || ring_signed_area(&cleaned) == 0.0 {
        return Vec::new();
    }
    cleaned
}

/// Outer rings clockwise, holes counter-clockwise (in y-down tile coordinates).
fn ensure_winding_order(mut ring: Vec<(f64, f64)>, is_hole: bool) -> Vec<(f64, f64)> {
    let is_clockwise = ring_signed_area(&ring) > 0.0;
    if is_clockwise == is_hole {
        ring.reverse();
    }
    ring
}

/// Project, clip, round and clean one ring for `coord`.
fn prepare_ring(ring: &LineString<f64>, coord: TileCoord, is_hole: bool) -> Vec<(f64, f64)> {
    let extent = EXTENT as f64;
    let projected: Vec<(f64, f64)> = ring
        .coords()
        .filter(|c| c.x.is_finite() && c.y.is_finite())
        .map(|c| world_to_tile_coords(*c, coord, extent))
        .collect();
    let rounded = clip_ring_to_tile(&projected, extent, BUFFER)
        .into_iter()
        .map(|(x, y)| (x.round(), y.round()))
        .collect();
    let cleaned = clean_ring(rounded);
    if cleaned.is_empty() {
        return cleaned;
    }
    ensure_winding_order(cleaned, is_hole)
}

/// Encode a tile's geographic polygons as a gzipped Mapbox Vector Tile.
///
/// All polygons go into one feature of the `polygons` layer. Returns `None`
/// when nothing survives clipping, so empty tiles are never written.
pub fn encode_tile(output: &MultiPolygon<f64>, coord: TileCoord) -> Result<Option<Vec<u8>>> {
    let mut encoder = GeomEncoder::new(GeomType::Polygon);
    let mut rings = 0;

    for polygon in output {
        let exterior = prepare_ring(polygon.exterior(), coord, false);
        if exterior.is_empty() {
            continue;
        }
        for (x, y) in exterior {
            encoder = encoder.point(x, y)?;
        }
        encoder = encoder.complete()?;
        rings += 1;

        for interior in polygon.interiors() {
            let hole = prepare_ring(interior, coord, true);
            if hole.is_empty() {
                continue;
            }
            for (x, y) in hole {
                encoder = encoder.point(x, y)?;
            }
            encoder = encoder.complete()?;
            rings += 1;
        }
    }
    if rings == 0 {
        return Ok(None);
    }

    let mut tile = Tile::new(EXTENT);
    let layer = tile.create_layer(LAYER_NAME);
    let geom_data = encoder.encode()?;
    let layer = layer.into_feature(geom_data).into_layer();
    tile.add_layer(layer)?;

    let tile_data = tile.to_bytes()?;
    let mut gz = GzEncoder::new(Vec::new(), Flate2Compression::default());
    gz.write_all(&tile_data)?;
    let compressed = gz.finish().context("[tiles::encode] Failed to gzip tile")?;
    Ok(Some(compressed))
}

#[cfg(test)]
mod tests {
    use super::{clean_ring, clip_ring_to_tile, encode_tile, ensure_winding_order, ring_signed_area};
    use crate::geom::TileCoord;
    use geo::{MultiPolygon, polygon};

    #[test]
    fn clipping_keeps_the_buffer() {
        let ring = vec![(-500.0, 100.0), (200.0, 100.0), (200.0, 300.0), (-500.0, 300.0)];
        let clipped = clip_ring_to_tile(&ring, 4096.0, 64.0);
        assert!(clipped.iter().all(|&(x, _)| x >= -64.0));
        assert!(clipped.contains(&(-64.0, 100.0)));
    }

    #[test]
    fn clipping_cuts_every_side() {
        let ring = vec![(-1000.0, -1000.0), (5000.0, -1000.0), (5000.0, 5000.0), (-1000.0, 5000.0)];
        let clipped = clip_ring_to_tile(&ring, 4096.0, 64.0);
        assert_eq!(clipped.len(), 4);
        for corner in [(-64.0, -64.0), (4160.0, -64.0), (4160.0, 4160.0), (-64.0, 4160.0)] {
            assert!(clipped.contains(&corner), "missing {corner:?}");
        }

        let outside = vec![(5000.0, 0.0), (6000.0, 0.0), (6000.0, 100.0)];
        assert!(clip_ring_to_tile(&outside, 4096.0, 64.0).is_empty());
        assert!(clip_ring_to_tile(&[], 4096.0, 64.0).is_empty());
    }

    #[test]
    fn clean_ring_removes_duplicates_and_spikes() {
        let ring = vec![(0.0, 0.0), (0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.0)];
        assert_eq!(clean_ring(ring), vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        assert!(clean_ring(vec![(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]).is_empty());
    }

    #[test]
    fn winding_follows_ring_role() {
        let counter = vec![(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)];
        assert!(ring_signed_area(&counter) < 0.0);
        assert!(ring_signed_area(&ensure_winding_order(counter.clone(), false)) > 0.0);
        assert!(ring_signed_area(&ensure_winding_order(counter, true)) < 0.0);
    }

    #[test]
    fn nothing_inside_the_tile_encodes_to_none() {
        let coord = TileCoord::new(4, 8, 8);
        let far = MultiPolygon(vec![polygon![(x: -170.0, y: 70.0), (x: -160.0, y: 70.0), (x: -160.0, y: 75.0)]]);
        assert!(encode_tile(&far, coord).unwrap().is_none());
        assert!(encode_tile(&MultiPolygon(vec![]), coord).unwrap().is_none());
    }

    #[test]
    fn tiles_are_gzipped() {
        let coord = TileCoord::new(0, 0, 0);
        let square = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 20.0, y: 0.0), (x: 20.0, y: 20.0), (x: 0.0, y: 20.0)]]);
        let bytes = encode_tile(&square, coord).unwrap().unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    }
}
