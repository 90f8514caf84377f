use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use ndarray::Array2;

use crate::common::{ensure_dir_exists, write_atomic};
use crate::geom::TileCoord;
use crate::raster::Raster;

/// Magic bytes for cached rasters: "CNRS" (Canopy Raster)
const MAGIC: &[u8] = b"CNRS";
/// Format version (currently 1)
const VERSION: u8 = 1;
const HEADER_LEN: usize = 4 + 1 + 4 + 4;

/// On-disk cache of pre-convolution rasters, one zlib-compressed file per tile.
///
/// Files are named `{z}_{x}_{y}.raster`. Every raster of zoom `z` is written
/// before any tile of zoom `z - 1` reads it, so reads never race writes.
#[derive(Debug, Clone)]
pub struct RasterCache {
    dir: PathBuf,
}

impl RasterCache {
    pub fn new(dir: &Path) -> Result<Self> {
        ensure_dir_exists(dir)?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    pub fn dir(&self) -> &Path { &self.dir }

    pub fn path(&self, coord: TileCoord) -> PathBuf {
        self.dir.join(format!("{}.raster", coord.key()))
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        self.path(coord).is_file()
    }

    /// Store a raster. Blank rasters are skipped; returns whether a file was written.
    pub fn put(&self, coord: TileCoord, raster: &Raster) -> Result<bool> {
        if raster.is_blank() {
            return Ok(false);
        }
        let mut out = Vec::with_capacity(HEADER_LEN + raster.canvas_size());
        out.write_all(MAGIC)?;
        out.write_all(&[VERSION])?;
        out.write_all(&(raster.size() as u32).to_le_bytes())?;
        out.write_all(&(raster.padding() as u32).to_le_bytes())?;

        let mut encoder = ZlibEncoder::new(out, Compression::fast());
        let samples = raster.samples().as_standard_layout();
        encoder.write_all(samples.as_slice().unwrap_or_default())?;
        let bytes = encoder.finish().context("[raster::cache] Failed to compress raster")?;
        write_atomic(&self.path(coord), &bytes)
            .with_context(|| format!("[raster::cache] Failed to cache raster for {coord}"))?;
        Ok(true)
    }

    /// Load a cached raster; `Ok(None)` when the tile was never cached.
    pub fn get(&self, coord: TileCoord) -> Result<Option<Raster>> {
        let path = self.path(coord);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("[raster::cache] Failed to read {}", path.display()));
            }
        };
        decode(&bytes)
            .with_context(|| format!("[raster::cache] Corrupt cached raster {}", path.display()))
            .map(Some)
    }

    /// Delete every cached raster.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("[raster::cache] Failed to list {}", self.dir.display()))?
        {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "raster" || ext == "tmp") {
                fs::remove_file(&path)
                    .with_context(|| format!("[raster::cache] Failed to remove {}", path.display()))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn decode(bytes: &[u8]) -> Result<Raster> {
    if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
        bail!("bad magic bytes");
    }
    if bytes[4] != VERSION {
        bail!("unsupported raster cache version {}", bytes[4]);
    }
    let size = u32::from_le_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]) as usize;
    let padding = u32::from_le_bytes([bytes[9], bytes[10], bytes[11], bytes[12]]) as usize;
    let side = size + 2 * padding;

    let mut samples = Vec::with_capacity(side * side);
    ZlibDecoder::new(&bytes[HEADER_LEN..])
        .read_to_end(&mut samples)
        .context("failed to decompress samples")?;
    let samples = Array2::from_shape_vec((side, side), samples)
        .context("sample count does not match header")?;
    Raster::from_samples(size, padding, samples)
}
