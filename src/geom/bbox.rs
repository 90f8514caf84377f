use rstar::{AABB, RTreeObject};
use serde::{Deserialize, Serialize};

use crate::geom::Bound;

/// A bounding box in an R-tree, associated with a stored geometry by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct BoundingBox {
    id: usize, // Position of the geometry in the store
    bound: Bound,
}

impl BoundingBox {
    pub(crate) fn new(id: usize, bound: Bound) -> Self {
        Self { id, bound }
    }

    /// Get the id of the corresponding geometry.
    pub(crate) fn id(&self) -> usize { self.id }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.bound.to_aabb()
    }
}
