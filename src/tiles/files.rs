use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::common::ensure_dir_exists;
use crate::geom::TileCoord;
use crate::tiles::TileSink;

/// Writes each tile to `{dir}/{z}_{x}_{y}.pbf`.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn create(dir: &Path) -> Result<Self> {
        ensure_dir_exists(dir)?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    pub fn path(&self, coord: TileCoord) -> PathBuf {
        self.dir.join(format!("{}.pbf", coord.key()))
    }
}

impl TileSink for FileSink {
    fn put_tile(&mut self, coord: TileCoord, bytes: &[u8]) -> Result<()> {
        let path = self.path(coord);
        std::fs::write(&path, bytes)
            .with_context(|| format!("[tiles::files] Failed to write {}", path.display()))
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
