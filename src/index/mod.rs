//! Persistent spatial index over the input geometries.
//!
//! Four files live in the index directory:
//!
//! - `geometries.bin` - WKB records concatenated back to back
//! - `pointers.bin` - one little-endian `(offset: u64, length: u64)` per record
//! - `rtree.bin` - the bincode-serialized R-tree of record bounds
//! - `bound.json` - union of every record bound, written last
//!
//! A directory missing any of them is treated as unbuilt.

mod build;
mod files;
mod rtree;
mod store;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::geom::Bound;

pub(crate) use files::IndexFiles;
pub use rtree::SpatialIndex;
pub use store::GeometryStore;

/// The spatial index, the geometry store it points into, and their global bound.
pub struct Dataset {
    index: SpatialIndex,
    store: GeometryStore,
    bound: Bound,
}

impl Dataset {
    /// Stream newline-delimited GeoJSON from `reader` into a fresh index under `dir`.
    ///
    /// Fails on the first malformed record (naming its line) or on empty input;
    /// no partial index is left behind.
    pub fn build(reader: impl std::io::BufRead, dir: &Path) -> Result<Self> {
        let files = IndexFiles::new(dir);
        build::write_index(reader, &files)?;
        Self::open(dir)
    }

    /// Open a previously built index.
    pub fn open(dir: &Path) -> Result<Self> {
        let files = IndexFiles::new(dir);
        let store = GeometryStore::open(&files.geometries(), &files.pointers())?;
        let index = SpatialIndex::read(&files.rtree())?;
        let bound_bytes = std::fs::read(files.bound())
            .with_context(|| format!("[index::open] Failed to read {}", files.bound().display()))?;
        let bound: Bound = serde_json::from_slice(&bound_bytes)
            .context("[index::open] Failed to parse bound.json")?;
        if index.len() != store.len() {
            anyhow::bail!(
                "[index::open] R-tree holds {} entries but the store holds {}",
                index.len(),
                store.len()
            );
        }
        Ok(Self { index, store, bound })
    }

    /// Open the index in `dir`, building it from `input` first if it is missing.
    pub fn open_or_build(input: &Path, dir: &Path) -> Result<Self> {
        if IndexFiles::new(dir).is_complete() {
            info!("[index] reusing index in {}", dir.display());
            return Self::open(dir);
        }
        info!("[index] building index from {}", input.display());
        let file = File::open(input)
            .with_context(|| format!("[index] Failed to open input {}", input.display()))?;
        Self::build(BufReader::new(file), dir)
    }

    pub fn index(&self) -> &SpatialIndex { &self.index }

    pub fn store(&self) -> &GeometryStore { &self.store }

    /// Union of all geometry bounds.
    pub fn bound(&self) -> &Bound { &self.bound }

    pub fn len(&self) -> usize { self.store.len() }

    pub fn is_empty(&self) -> bool { self.store.is_empty() }
}
