//! Pyramid orchestration: zoom scheduling, worker pool, and the top-level run.

mod context;
mod orchestrator;
mod progress;
mod render;

use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::common::ensure_dir_exists;
use crate::index::Dataset;
use crate::tiles::{ContainerFormat, TileMetadata};
use crate::tileset::{Manifest, Settings, Telemetry, Tileset};

pub use context::{RunSummary, TileOutcome};
pub use orchestrator::Pipeline;

/// Build (or reuse) the index for `input`, render every tile into a fresh
/// container in `output_dir`, and record the run in `tilesets.json`.
///
/// The index lives in `{work_dir}/index` and is reused across runs; the raster
/// cache in `{work_dir}/rasters` is cleared first so no stale raster from a
/// different configuration is read.
pub fn generate(
    input: &Path,
    work_dir: &Path,
    output_dir: &Path,
    settings: &Settings,
    format: ContainerFormat,
    threads: usize,
    progress: bool,
) -> Result<Tileset> {
    settings.validate().context("[pipeline::generate] invalid settings")?;
    ensure_dir_exists(work_dir)?;
    ensure_dir_exists(output_dir)?;

    let dataset = Dataset::open_or_build(input, &work_dir.join("index"))?;
    let id = settings.id()?;
    let pipeline = Pipeline::new(&dataset, settings.clone(), work_dir)?.with_progress(progress);
    let cleared = pipeline.cache().clear()?;
    if cleared > 0 {
        info!("[pipeline::generate] cleared {cleared} cached rasters");
    }

    let path = format.container_path(output_dir, &id);
    let metadata = TileMetadata {
        name: id.clone(),
        bound: *dataset.bound(),
        min_zoom: settings.min_zoom,
        max_zoom: settings.max_zoom,
    };
    info!("[pipeline::generate] writing tileset {id} to {}", path.display());
    let mut sink = format.create_sink(&path, metadata)?;
    let summary = pipeline.run(sink.as_mut(), threads)?;

    let tileset = Tileset {
        id,
        settings: settings.clone(),
        telemetry: Telemetry {
            tile_count: summary.tiles_written,
            failed_count: summary.tiles_failed,
            time: summary.elapsed.as_secs_f64(),
        },
    };
    let manifest_path = output_dir.join(Manifest::FILE_NAME);
    let mut manifest = Manifest::load(&manifest_path)?;
    manifest.upsert(tileset.clone());
    manifest.save(&manifest_path)?;
    Ok(tileset)
}
