use std::fs::File;
use std::io::{BufRead, BufWriter, Write};

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};

use crate::common::{ensure_dir_exists, write_atomic};
use crate::geom::{Bound, BoundingBox};
use crate::index::{IndexFiles, SpatialIndex};
use crate::io::{geojson, wkb};

/// Build every index file, removing all of them again if any step fails.
pub(super) fn write_index(reader: impl BufRead, files: &IndexFiles) -> Result<()> {
    ensure_dir_exists(files.dir())?;
    // Stale files from an earlier build must not be mistaken for a finished index.
    files.remove_all()?;

    let result = write_index_files(reader, files);
    if result.is_err() {
        if let Err(cleanup) = files.remove_all() {
            warn!("[index::build] failed to remove partial index: {cleanup:#}");
        }
    }
    result
}

fn write_index_files(reader: impl BufRead, files: &IndexFiles) -> Result<()> {
    let mut geometries = BufWriter::new(
        File::create(files.geometries())
            .with_context(|| format!("[index::build] Failed to create {}", files.geometries().display()))?,
    );
    let mut pointers = BufWriter::new(
        File::create(files.pointers())
            .with_context(|| format!("[index::build] Failed to create {}", files.pointers().display()))?,
    );

    let mut entries = Vec::new();
    let mut global = Bound::empty();
    let mut offset = 0u64;

    for (line_idx, line) in reader.lines().enumerate() {
        let line_no = line_idx + 1;
        let line = line.with_context(|| format!("[index::build] Failed to read line {line_no}"))?;
        if line.trim().is_empty() {
            continue;
        }

        let geometry = geojson::parse_geometry(line.as_bytes())
            .with_context(|| format!("[index::build] Malformed geometry on line {line_no}"))?;
        let bound = Bound::of_multipolygon(&geometry);
        if bound.is_empty() {
            bail!("[index::build] Geometry on line {line_no} has no coordinates");
        }

        let bytes = wkb::multipolygon_to_wkb(&geometry)
            .with_context(|| format!("[index::build] Failed to encode geometry on line {line_no}"))?;
        geometries.write_all(&bytes)?;
        pointers.write_all(&offset.to_le_bytes())?;
        pointers.write_all(&(bytes.len() as u64).to_le_bytes())?;
        offset += bytes.len() as u64;

        global.union(&bound);
        entries.push(BoundingBox::new(entries.len(), bound));
        if entries.len() % 100_000 == 0 {
            debug!("[index::build] {} geometries stored", entries.len());
        }
    }

    if entries.is_empty() {
        bail!("[index::build] Input contains no geometries");
    }

    geometries.flush().context("[index::build] Failed to flush geometries")?;
    pointers.flush().context("[index::build] Failed to flush pointers")?;

    let count = entries.len();
    SpatialIndex::bulk_load(entries).write(&files.rtree())?;

    // bound.json marks the index as complete, so it goes last.
    let bound_json = serde_json::to_vec_pretty(&global)
        .context("[index::build] Failed to serialize bound")?;
    write_atomic(&files.bound(), &bound_json)?;

    info!(
        "[index::build] indexed {count} geometries ({offset} bytes), bound [{:.5}, {:.5}, {:.5}, {:.5}]",
        global.min_x, global.min_y, global.max_x, global.max_y
    );
    Ok(())
}
