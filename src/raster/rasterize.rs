use anyhow::{Context, Result};
use geo::{Coord, Polygon};

use crate::geom::{PixelSpace, TileCoord};
use crate::index::Dataset;
use crate::raster::Raster;
use crate::tileset::Settings;

/// Burn every geometry that touches the padded tile into a fresh raster.
///
/// Returns `None` when the index finds no candidate geometry at all. A pixel is
/// set to 255 when its centre lies inside a polygon under the even-odd rule,
/// so holes stay clear.
pub fn rasterize(coord: TileCoord, dataset: &Dataset, settings: &Settings) -> Result<Option<Raster>> {
    let query = coord.bound(settings.padding_fraction());
    let ids = dataset.index().search(&query);
    if ids.is_empty() {
        return Ok(None);
    }

    let mut raster = Raster::new(settings.raster_size as usize, settings.padding_pixels());
    let space = PixelSpace::new(coord, raster.size(), raster.padding());
    for id in ids {
        let geometry = dataset.store().get(id)
            .with_context(|| format!("[raster::rasterize] Failed to load geometry {id} for tile {coord}"))?;
        for polygon in &geometry {
            fill_polygon(&mut raster, polygon, &space);
        }
    }
    Ok(Some(raster))
}

/// An edge with `a.y < b.y`, in pixel coordinates.
struct Edge {
    a: Coord<f64>,
    b: Coord<f64>,
}

fn fill_polygon(raster: &mut Raster, polygon: &Polygon<f64>, space: &PixelSpace) {
    let side = raster.canvas_size() as f64;
    let mut edges = Vec::new();
    for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
        let pixels: Vec<Coord<f64>> = ring.coords().map(|c| space.to_pixel(*c)).collect();
        let n = pixels.len();
        for i in 0..n {
            let (p, q) = (pixels[i], pixels[(i + 1) % n]);
            if p.y == q.y {
                continue;
            }
            let (a, b) = if p.y < q.y { (p, q) } else { (q, p) };
            // Only edges that reach a row centre on the canvas matter.
            if b.y < 0.5 || a.y > side - 0.5 {
                continue;
            }
            edges.push(Edge { a, b });
        }
    }
    if edges.is_empty() {
        return;
    }

    let min_y = edges.iter().map(|e| e.a.y).fold(f64::INFINITY, f64::min);
    let max_y = edges.iter().map(|e| e.b.y).fold(f64::NEG_INFINITY, f64::max);
    let first_row = (min_y - 0.5).ceil().max(0.0) as usize;
    let last_row = ((max_y - 0.5).ceil() as i64).min(side as i64) as usize;

    let mut crossings = Vec::new();
    for row in first_row..last_row {
        let y = row as f64 + 0.5;
        crossings.clear();
        // Half-open test so a vertex exactly on the row centre is counted once.
        for edge in edges.iter().filter(|e| e.a.y <= y && y < e.b.y) {
            let t = (y - edge.a.y) / (edge.b.y - edge.a.y);
            crossings.push(edge.a.x + t * (edge.b.x - edge.a.x));
        }
        crossings.sort_by(f64::total_cmp);
        for span in crossings.chunks_exact(2) {
            let start = (span[0] - 0.5).ceil().clamp(0.0, side) as usize;
            let end = (span[1] - 0.5).ceil().clamp(0.0, side) as usize;
            for col in start..end {
                raster.set(col, row, 255);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fill_polygon;
    use crate::geom::{PixelSpace, TileCoord};
    use crate::raster::Raster;
    use geo::polygon;

    /// Pixel space where one degree is roughly one pixel near the origin of tile 0/0/0.
    fn world_space(size: usize) -> PixelSpace {
        PixelSpace::new(TileCoord::new(0, 0, 0), size, 0)
    }

    #[test]
    fn square_fills_pixel_centres_inside() {
        let mut raster = Raster::new(360, 0);
        let space = world_space(360);
        let square = polygon![(x: 0.0, y: -10.0), (x: 10.0, y: -10.0), (x: 10.0, y: 0.0), (x: 0.0, y: 0.0)];
        fill_polygon(&mut raster, &square, &space);

        let filled = raster.samples().iter().filter(|&&v| v == 255).count();
        assert_eq!(filled, 100);
        assert_eq!(raster.get(185, 185), 255);
        assert_eq!(raster.get(179, 185), 0);
        assert_eq!(raster.get(190, 185), 0);
    }

    #[test]
    fn holes_stay_clear() {
        let mut raster = Raster::new(360, 0);
        let space = world_space(360);
        let donut = polygon!(
            exterior: [(x: 0.0, y: -20.0), (x: 20.0, y: -20.0), (x: 20.0, y: 0.0), (x: 0.0, y: 0.0)],
            interiors: [[(x: 5.0, y: -15.0), (x: 15.0, y: -15.0), (x: 15.0, y: -5.0), (x: 5.0, y: -5.0)]]
        );
        fill_polygon(&mut raster, &donut, &space);

        let (cx, cy) = space.to_pixel(geo::Coord { x: 10.0, y: -10.0 }).x_y();
        assert_eq!(raster.get(cx as usize, cy as usize), 0);
        let (rx, ry) = space.to_pixel(geo::Coord { x: 2.5, y: -10.0 }).x_y();
        assert_eq!(raster.get(rx as usize, ry as usize), 255);
    }

    #[test]
    fn geometry_outside_the_canvas_is_ignored() {
        let mut raster = Raster::new(64, 4);
        let space = PixelSpace::new(TileCoord::new(4, 0, 0), 64, 4);
        let far = polygon![(x: 100.0, y: -40.0), (x: 110.0, y: -40.0), (x: 110.0, y: -30.0)];
        fill_polygon(&mut raster, &far, &space);
        assert!(raster.is_blank());
    }
}
