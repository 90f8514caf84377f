//! Vector tile encoding and the containers tiles are written to.
//!
//! - `files` - one `{z}_{x}_{y}.pbf` file per tile
//! - `mbtiles` - SQLite MBTiles (requires `mbtiles` feature)
//! - `pmtiles` - single-file PMTiles archive (requires `pmtiles` feature)

mod encode;
mod files;
#[cfg(feature = "mbtiles")]
mod mbtiles;
#[cfg(feature = "pmtiles")]
mod pmtiles;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::geom::{Bound, TileCoord};

pub use encode::{LAYER_NAME, encode_tile, tile_output};
pub use files::FileSink;
#[cfg(feature = "mbtiles")]
pub use mbtiles::MbtilesSink;
#[cfg(feature = "pmtiles")]
pub use pmtiles::PmtilesSink;

/// Write access to a tile container.
///
/// Writing the same coordinate twice keeps the last bytes. `finish` makes the
/// container durable and must succeed even when no tile was written.
pub trait TileSink {
    fn put_tile(&mut self, coord: TileCoord, bytes: &[u8]) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

/// Descriptive fields stored alongside the tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMetadata {
    pub name: String,
    pub bound: Bound,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl TileMetadata {
    /// `vector_layers` entry describing the single geometry-only layer.
    pub(crate) fn vector_layers(&self) -> serde_json::Value {
        serde_json::json!([{
            "id": LAYER_NAME,
            "fields": {},
            "minzoom": self.min_zoom,
            "maxzoom": self.max_zoom,
        }])
    }

    pub(crate) fn center(&self) -> (f64, f64) {
        ((self.bound.min_x + self.bound.max_x) / 2.0, (self.bound.min_y + self.bound.max_y) / 2.0)
    }
}

/// How a finished pyramid is packaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    #[default]
    Mbtiles,
    Pmtiles,
    Files,
}

impl ContainerFormat {
    /// Where the container for tileset `id` lives inside `output_dir`.
    pub fn container_path(&self, output_dir: &Path, id: &str) -> PathBuf {
        match self {
            ContainerFormat::Mbtiles => output_dir.join(format!("{id}.mbtiles")),
            ContainerFormat::Pmtiles => output_dir.join(format!("{id}.pmtiles")),
            ContainerFormat::Files => output_dir.join(id),
        }
    }

    /// Create a fresh container at `path`, replacing whatever was there.
    pub fn create_sink(&self, path: &Path, metadata: TileMetadata) -> Result<Box<dyn TileSink>> {
        crate::common::remove_if_exists(path)?;
        match self {
            ContainerFormat::Files => Ok(Box::new(FileSink::create(path)?)),
            #[cfg(feature = "mbtiles")]
            ContainerFormat::Mbtiles => Ok(Box::new(MbtilesSink::create(path, metadata)?)),
            #[cfg(not(feature = "mbtiles"))]
            ContainerFormat::Mbtiles => {
                let _ = metadata;
                bail!("MBTiles output requires the 'mbtiles' feature to be enabled")
            }
            #[cfg(feature = "pmtiles")]
            ContainerFormat::Pmtiles => Ok(Box::new(PmtilesSink::create(path, metadata)?)),
            #[cfg(not(feature = "pmtiles"))]
            ContainerFormat::Pmtiles => {
                let _ = metadata;
                bail!("PMTiles output requires the 'pmtiles' feature to be enabled")
            }
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContainerFormat::Mbtiles => "mbtiles",
            ContainerFormat::Pmtiles => "pmtiles",
            ContainerFormat::Files => "files",
        })
    }
}

impl FromStr for ContainerFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mbtiles" => Ok(ContainerFormat::Mbtiles),
            "pmtiles" => Ok(ContainerFormat::Pmtiles),
            "files" | "dir" => Ok(ContainerFormat::Files),
            other => bail!("unknown container format {other:?} (expected mbtiles, pmtiles or files)"),
        }
    }
}
