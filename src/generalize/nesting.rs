use geo::{Area, BoundingRect, Contains, Coord, LineString, Point, Polygon, Rect};
use smallvec::SmallVec;

use crate::generalize::Ring;

/// A traced ring and its place in the containment tree.
struct RingDescriptor {
    polygon: Polygon<f64>,
    rect: Rect<f64>,
    area: f64,
    /// A point strictly inside the ring's edges, used to test containment.
    inner_point: Point<f64>,
    parent: Option<usize>,
    children: SmallVec<[usize; 4]>,
}

impl RingDescriptor {
    fn new(ring: Ring) -> Option<Self> {
        if ring.len() < 4 {
            return None;
        }
        let inner_point = Point::from(Coord {
            x: (ring[0].x + ring[1].x) / 2.0,
            y: (ring[0].y + ring[1].y) / 2.0,
        });
        let polygon = Polygon::new(LineString::from(ring), vec![]);
        let rect = polygon.bounding_rect()?;
        let area = polygon.unsigned_area();
        Some(Self { polygon, rect, area, inner_point, parent: None, children: SmallVec::new() })
    }

    fn may_contain(&self, other: &RingDescriptor) -> bool {
        self.rect.min().x <= other.rect.min().x
            && self.rect.min().y <= other.rect.min().y
            && self.rect.max().x >= other.rect.max().x
            && self.rect.max().y >= other.rect.max().y
    }
}

/// Arena of ring descriptors; parents and children are indices into it.
struct RingArena {
    rings: Vec<RingDescriptor>,
}

impl RingArena {
    fn new(rings: Vec<Ring>) -> Self {
        Self { rings: rings.into_iter().filter_map(RingDescriptor::new).collect() }
    }

    /// The smallest ring containing ring `i`; ties go to the earliest ring.
    fn find_parent(&self, i: usize) -> Option<usize> {
        let ring = &self.rings[i];
        let mut best: Option<usize> = None;
        for (j, candidate) in self.rings.iter().enumerate() {
            if j == i || !candidate.may_contain(ring) || !candidate.polygon.contains(&ring.inner_point) {
                continue;
            }
            if best.is_none_or(|b| candidate.area < self.rings[b].area) {
                best = Some(j);
            }
        }
        best
    }

    fn depth(&self, mut i: usize) -> usize {
        let mut depth = 0;
        while let Some(parent) = self.rings[i].parent {
            depth += 1;
            i = parent;
        }
        depth
    }

    /// Link every odd-depth ring to its parent as a hole; even-depth rings become outers.
    fn resolve(&mut self) {
        let parents: Vec<Option<usize>> = (0..self.rings.len()).map(|i| self.find_parent(i)).collect();
        for (ring, parent) in self.rings.iter_mut().zip(&parents) {
            ring.parent = *parent;
        }

        let depths: Vec<usize> = (0..self.rings.len()).map(|i| self.depth(i)).collect();
        for (i, depth) in depths.into_iter().enumerate() {
            if depth % 2 == 0 {
                self.rings[i].parent = None;
            } else if let Some(parent) = self.rings[i].parent {
                self.rings[parent].children.push(i);
            }
        }
    }

    fn into_polygons(self) -> Vec<Polygon<f64>> {
        let outers: Vec<usize> = (0..self.rings.len()).filter(|&i| self.rings[i].parent.is_none()).collect();
        outers
            .into_iter()
            .map(|i| {
                let exterior = self.rings[i].polygon.exterior().clone();
                let holes = self.rings[i]
                    .children
                    .iter()
                    .map(|&child| self.rings[child].polygon.exterior().clone())
                    .collect();
                Polygon::new(exterior, holes)
            })
            .collect()
    }
}

/// Assemble traced rings into polygons with holes by nesting depth.
///
/// Rings shorter than 4 points are dropped. A ring's parent is the smallest
/// other ring that contains it; rings at even depth become outer rings and
/// rings at odd depth become holes of their parent. Rings must not cross one
/// another, which traced outlines never do.
pub fn nest(rings: Vec<Ring>) -> Vec<Polygon<f64>> {
    let mut arena = RingArena::new(rings);
    arena.resolve();
    arena.into_polygons()
}

#[cfg(test)]
mod tests {
    use super::nest;
    use geo::{Area, Coord, Polygon};

    fn square(center: f64, half: f64) -> Vec<Coord<f64>> {
        let (lo, hi) = (center - half, center + half);
        vec![Coord { x: lo, y: lo }, Coord { x: lo, y: hi }, Coord { x: hi, y: hi }, Coord { x: hi, y: lo }]
    }

    #[test]
    fn concentric_squares_alternate_outer_hole_outer() {
        let polygons = nest(vec![square(50.0, 40.0), square(50.0, 25.0), square(50.0, 10.0)]);
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].interiors().len(), 1);
        assert_eq!(Polygon::new(polygons[0].exterior().clone(), vec![]).unsigned_area(), 80.0 * 80.0);
        assert_eq!(polygons[0].interiors()[0].0.len(), 5);
        assert!(polygons[1].interiors().is_empty());
        assert_eq!(polygons[1].unsigned_area(), 20.0 * 20.0);
    }

    #[test]
    fn input_order_does_not_change_the_tree() {
        let polygons = nest(vec![square(50.0, 10.0), square(50.0, 40.0), square(50.0, 25.0)]);
        let mut areas: Vec<f64> = polygons.iter().map(|p| p.unsigned_area()).collect();
        areas.sort_by(f64::total_cmp);
        assert_eq!(areas, vec![400.0, 6400.0 - 2500.0]);
    }

    #[test]
    fn siblings_are_separate_polygons_and_short_rings_are_dropped() {
        let short = vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }];
        let polygons = nest(vec![square(10.0, 5.0), square(30.0, 5.0), short]);
        assert_eq!(polygons.len(), 2);
        assert!(polygons.iter().all(|p| p.interiors().is_empty()));
    }

    #[test]
    fn two_holes_share_one_parent() {
        let outer = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 0.0, y: 20.0 },
            Coord { x: 40.0, y: 20.0 },
            Coord { x: 40.0, y: 0.0 },
        ];
        let left = vec![
            Coord { x: 5.0, y: 5.0 },
            Coord { x: 5.0, y: 15.0 },
            Coord { x: 15.0, y: 15.0 },
            Coord { x: 15.0, y: 5.0 },
        ];
        let right = vec![
            Coord { x: 25.0, y: 5.0 },
            Coord { x: 25.0, y: 15.0 },
            Coord { x: 35.0, y: 15.0 },
            Coord { x: 35.0, y: 5.0 },
        ];
        let polygons = nest(vec![outer, left, right]);
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].interiors().len(), 2);
        assert_eq!(polygons[0].unsigned_area(), 800.0 - 200.0);
    }
}
