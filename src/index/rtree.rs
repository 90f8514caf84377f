use std::path::Path;

use anyhow::{Context, Result};
use rstar::RTree;

use crate::geom::{Bound, BoundingBox};

/// R-tree over geometry bounds, answering "which geometries may touch this box".
pub struct SpatialIndex {
    rtree: RTree<BoundingBox>,
}

impl SpatialIndex {
    pub(crate) fn bulk_load(entries: Vec<BoundingBox>) -> Self {
        Self { rtree: RTree::bulk_load(entries) }
    }

    pub fn len(&self) -> usize { self.rtree.size() }

    pub fn is_empty(&self) -> bool { self.rtree.size() == 0 }

    /// Ids of every geometry whose bound intersects `bound`, ascending.
    ///
    /// Bounds that only share an edge with the query are included.
    pub fn search(&self, bound: &Bound) -> Vec<usize> {
        if bound.is_empty() {
            return Vec::new();
        }
        let mut ids: Vec<usize> = self.rtree
            .locate_in_envelope_intersecting(&bound.to_aabb())
            .map(|entry| entry.id())
            .collect();
        ids.sort_unstable();
        ids
    }

    pub(crate) fn write(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serialize(&self.rtree)
            .context("[index::rtree] Failed to serialize R-tree")?;
        std::fs::write(path, bytes)
            .with_context(|| format!("[index::rtree] Failed to write {}", path.display()))
    }

    pub(crate) fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("[index::rtree] Failed to read {}", path.display()))?;
        let rtree = bincode::deserialize(&bytes)
            .context("[index::rtree] Failed to deserialize R-tree")?;
        Ok(Self { rtree })
    }
}

#[cfg(test)]
mod tests {
    use super::SpatialIndex;
    use crate::geom::{Bound, BoundingBox};

    #[test]
    fn search_includes_touching_and_sorts_ids() {
        let index = SpatialIndex::bulk_load(vec![
            BoundingBox::new(2, Bound::new(1.0, 0.0, 2.0, 1.0)),
            BoundingBox::new(0, Bound::new(0.0, 0.0, 1.0, 1.0)),
            BoundingBox::new(1, Bound::new(5.0, 5.0, 6.0, 6.0)),
        ]);
        assert_eq!(index.search(&Bound::new(0.5, 0.5, 1.0, 0.75)), vec![0, 2]);
        assert_eq!(index.search(&Bound::new(10.0, 10.0, 11.0, 11.0)), Vec::<usize>::new());
        assert!(index.search(&Bound::empty()).is_empty());
    }

    #[test]
    fn survives_a_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rtree.bin");
        let entries: Vec<_> = (0..50)
            .map(|i| BoundingBox::new(i, Bound::new(i as f64, 0.0, i as f64 + 0.5, 0.5)))
            .collect();
        SpatialIndex::bulk_load(entries).write(&path).unwrap();

        let index = SpatialIndex::read(&path).unwrap();
        assert_eq!(index.len(), 50);
        assert_eq!(index.search(&Bound::new(9.9, 0.1, 12.1, 0.2)), vec![10, 11, 12]);
    }
}
