use anyhow::{Context, Result, ensure};
use log::trace;

use crate::generalize::generalize;
use crate::geom::TileCoord;
use crate::index::Dataset;
use crate::raster::{RasterCache, downsample, rasterize};
use crate::tiles::{encode_tile, tile_output};
use crate::tileset::Settings;

/// Render one tile: raster (from geometry at the finest zoom, from the
/// cached rasters below otherwise), generalized polygons, encoded bytes.
///
/// The pre-convolution raster is cached whenever a coarser zoom will read it.
/// `Ok(None)` means the tile has nothing to draw.
pub(crate) fn render_tile(
    coord: TileCoord,
    dataset: &Dataset,
    cache: &RasterCache,
    settings: &Settings,
) -> Result<Option<Vec<u8>>> {
    ensure!(coord.is_valid(), "[pipeline::render] tile {coord} is outside the world");
    let raster = if coord.z == settings.max_zoom {
        rasterize(coord, dataset, settings)?
    } else {
        downsample(coord, cache, settings)?
    };
    let Some(raster) = raster else {
        return Ok(None);
    };

    if settings.caches(coord) {
        cache.put(coord, &raster).with_context(|| format!("[pipeline::render] caching {coord}"))?;
    }

    let polygons = generalize(raster, settings);
    if polygons.is_empty() {
        return Ok(None);
    }
    trace!("[pipeline::render] {coord}: {} polygons", polygons.len());
    let output = tile_output(&polygons, coord, settings);
    encode_tile(&output, coord)
}
