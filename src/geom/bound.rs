use geo::{Coord, CoordsIter, MultiPolygon};
use rstar::AABB;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in `(lng, lat)` degrees.
///
/// Edges are inclusive: two bounds that share only an edge intersect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bound {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// The identity for [`Bound::extend`]; contains nothing.
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Bound of every coordinate of a multipolygon. Empty if it has none.
    pub fn of_multipolygon(geometry: &MultiPolygon<f64>) -> Self {
        geometry.coords_iter().fold(Self::empty(), |mut bound, coord| {
            bound.extend(coord);
            bound
        })
    }

    pub fn is_empty(&self) -> bool {
        !(self.min_x <= self.max_x && self.min_y <= self.max_y)
    }

    /// Grow to include a coordinate.
    pub fn extend(&mut self, coord: Coord<f64>) {
        self.min_x = self.min_x.min(coord.x);
        self.min_y = self.min_y.min(coord.y);
        self.max_x = self.max_x.max(coord.x);
        self.max_y = self.max_y.max(coord.y);
    }

    /// Grow to include another bound.
    pub fn union(&mut self, other: &Bound) {
        if other.is_empty() {
            return;
        }
        self.extend(Coord { x: other.min_x, y: other.min_y });
        self.extend(Coord { x: other.max_x, y: other.max_y });
    }

    pub fn intersects(&self, other: &Bound) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    pub fn contains(&self, coord: Coord<f64>) -> bool {
        self.min_x <= coord.x && coord.x <= self.max_x && self.min_y <= coord.y && coord.y <= self.max_y
    }

    pub fn width(&self) -> f64 { self.max_x - self.min_x }

    pub fn height(&self) -> f64 { self.max_y - self.min_y }

    pub(crate) fn to_aabb(&self) -> AABB<[f64; 2]> {
        AABB::from_corners([self.min_x, self.min_y], [self.max_x, self.max_y])
    }
}

impl Default for Bound {
    fn default() -> Self { Self::empty() }
}

#[cfg(test)]
mod tests {
    use super::Bound;
    use geo::{Coord, MultiPolygon, polygon};

    #[test]
    fn empty_bound_intersects_nothing() {
        let empty = Bound::empty();
        assert!(empty.is_empty());
        assert!(!empty.intersects(&Bound::new(-180.0, -90.0, 180.0, 90.0)));
    }

    #[test]
    fn shared_edge_counts_as_intersection() {
        let a = Bound::new(0.0, 0.0, 1.0, 1.0);
        let b = Bound::new(1.0, 0.5, 2.0, 2.0);
        let c = Bound::new(1.5, 0.0, 2.0, 1.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn extend_and_union_grow_the_bound() {
        let mut bound = Bound::empty();
        bound.extend(Coord { x: 2.0, y: -1.0 });
        assert!(!bound.is_empty());
        bound.union(&Bound::new(-3.0, 0.0, 0.0, 4.0));
        bound.union(&Bound::empty());
        assert_eq!(bound, Bound::new(-3.0, -1.0, 2.0, 4.0));
    }

    #[test]
    fn multipolygon_bound_covers_holes_and_parts() {
        let geometry = MultiPolygon(vec![
            polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)],
            polygon![(x: 10.0, y: -2.0), (x: 11.0, y: -2.0), (x: 11.0, y: -1.0)],
        ]);
        assert_eq!(Bound::of_multipolygon(&geometry), Bound::new(0.0, -2.0, 11.0, 4.0));
    }
}
