use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::common::remove_if_exists;

/// File layout of an index directory.
#[derive(Debug, Clone)]
pub(crate) struct IndexFiles {
    dir: PathBuf,
}

impl IndexFiles {
    pub(crate) fn new(dir: &Path) -> Self {
        Self { dir: dir.to_path_buf() }
    }

    pub(crate) fn dir(&self) -> &Path { &self.dir }

    pub(crate) fn geometries(&self) -> PathBuf { self.dir.join("geometries.bin") }

    pub(crate) fn pointers(&self) -> PathBuf { self.dir.join("pointers.bin") }

    pub(crate) fn rtree(&self) -> PathBuf { self.dir.join("rtree.bin") }

    pub(crate) fn bound(&self) -> PathBuf { self.dir.join("bound.json") }

    fn all(&self) -> [PathBuf; 4] {
        [self.geometries(), self.pointers(), self.rtree(), self.bound()]
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.all().iter().all(|path| path.is_file())
    }

    pub(crate) fn remove_all(&self) -> Result<()> {
        for path in self.all() {
            remove_if_exists(&path)?;
        }
        Ok(())
    }
}
