use geo::{Coord, LineString, Polygon, Simplify};

use crate::generalize::Ring;

/// Douglas-Peucker simplification of a closed ring.
///
/// The ring is simplified as a closed line and returned open again. Returns an
/// empty ring when fewer than 3 distinct vertices survive.
pub fn simplify_ring(ring: &[Coord<f64>], tolerance: f64) -> Ring {
    if ring.len() < 3 {
        return Vec::new();
    }
    if tolerance <= 0.0 {
        return ring.to_vec();
    }
    let mut line = LineString::from(ring.to_vec());
    line.close();
    let mut simplified = line.simplify(&tolerance).0;
    if simplified.len() > 1 && simplified.first() == simplified.last() {
        simplified.pop();
    }
    if simplified.len() < 3 {
        return Vec::new();
    }
    simplified
}

/// Simplify every ring of a polygon; `None` when the exterior collapses.
/// Holes that collapse are dropped.
pub(crate) fn simplify_polygon(polygon: &Polygon<f64>, tolerance: f64) -> Option<Polygon<f64>> {
    let open = |line: &LineString<f64>| -> Ring {
        let mut coords = line.0.clone();
        if coords.len() > 1 && coords.first() == coords.last() {
            coords.pop();
        }
        coords
    };
    let exterior = simplify_ring(&open(polygon.exterior()), tolerance);
    if exterior.is_empty() {
        return None;
    }
    let holes = polygon
        .interiors()
        .iter()
        .map(|hole| simplify_ring(&open(hole), tolerance))
        .filter(|hole| !hole.is_empty())
        .map(LineString::from)
        .collect();
    Some(Polygon::new(LineString::from(exterior), holes))
}

#[cfg(test)]
mod tests {
    use super::{simplify_polygon, simplify_ring};
    use geo::{Coord, polygon};

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    #[test]
    fn drops_nearly_collinear_vertices() {
        let ring = vec![c(0.0, 0.0), c(5.0, 0.2), c(10.0, 0.0), c(10.0, 10.0), c(0.0, 10.0)];
        let simplified = simplify_ring(&ring, 1.0);
        assert_eq!(simplified, vec![c(0.0, 0.0), c(10.0, 0.0), c(10.0, 10.0), c(0.0, 10.0)]);
    }

    #[test]
    fn zero_tolerance_keeps_everything() {
        let ring = vec![c(0.0, 0.0), c(5.0, 0.2), c(10.0, 0.0), c(10.0, 10.0)];
        assert_eq!(simplify_ring(&ring, 0.0), ring);
    }

    #[test]
    fn slivers_collapse() {
        let ring = vec![c(0.0, 0.0), c(50.0, 0.3), c(100.0, 0.0), c(50.0, -0.3)];
        assert!(simplify_ring(&ring, 1.0).is_empty());
    }

    #[test]
    fn collapsed_holes_are_dropped_but_the_polygon_survives() {
        let donut = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 100.0), (x: 0.0, y: 100.0)],
            interiors: [[(x: 40.0, y: 50.0), (x: 50.0, y: 50.2), (x: 60.0, y: 50.0), (x: 50.0, y: 49.8)]]
        );
        let simplified = simplify_polygon(&donut, 1.0).unwrap();
        assert!(simplified.interiors().is_empty());
        assert_eq!(simplified.exterior().0.len(), 5);
    }
}
