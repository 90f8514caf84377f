use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use geo::MultiPolygon;
use memmap2::Mmap;

use crate::io::wkb;

/// Location of one record inside `geometries.bin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pointer {
    offset: u64,
    length: u64,
}

/// Read-only, memory-mapped access to the stored geometries.
///
/// Reads take `&self` and touch no shared mutable state, so one store can
/// serve every worker thread at once.
pub struct GeometryStore {
    blob: Mmap,
    pointers: Vec<Pointer>,
}

impl GeometryStore {
    pub(crate) fn open(blob_path: &Path, pointers_path: &Path) -> Result<Self> {
        let raw = std::fs::read(pointers_path)
            .with_context(|| format!("[index::store] Failed to read {}", pointers_path.display()))?;
        if raw.len() % 16 != 0 {
            bail!("[index::store] {} is not a whole number of pointers", pointers_path.display());
        }
        let pointers: Vec<Pointer> = raw
            .chunks_exact(16)
            .map(|chunk| {
                let (offset, length) = chunk.split_at(8);
                Pointer {
                    offset: u64::from_le_bytes(offset.try_into().unwrap_or_default()),
                    length: u64::from_le_bytes(length.try_into().unwrap_or_default()),
                }
            })
            .collect();

        let file = File::open(blob_path)
            .with_context(|| format!("[index::store] Failed to open {}", blob_path.display()))?;
        // SAFETY: index files are written once before they are opened and never modified afterwards.
        let blob = unsafe { Mmap::map(&file) }
            .with_context(|| format!("[index::store] Failed to map {}", blob_path.display()))?;

        let mut next_offset = 0u64;
        for (id, pointer) in pointers.iter().enumerate() {
            if pointer.offset < next_offset || pointer.length == 0 {
                bail!("[index::store] Pointer {id} is empty or overlaps the previous record");
            }
            next_offset = pointer.offset + pointer.length;
        }
        if next_offset > blob.len() as u64 {
            bail!("[index::store] Pointers run past the end of {}", blob_path.display());
        }

        Ok(Self { blob, pointers })
    }

    pub fn len(&self) -> usize { self.pointers.len() }

    pub fn is_empty(&self) -> bool { self.pointers.is_empty() }

    /// Raw WKB bytes of record `id`.
    pub fn get_bytes(&self, id: usize) -> Result<&[u8]> {
        let pointer = self.pointers.get(id)
            .ok_or_else(|| anyhow!("[index::store] No geometry with id {id}"))?;
        let start = pointer.offset as usize;
        Ok(&self.blob[start..start + pointer.length as usize])
    }

    /// Decode record `id`.
    pub fn get(&self, id: usize) -> Result<MultiPolygon<f64>> {
        let bytes = self.get_bytes(id)?;
        wkb::multipolygon_from_wkb(bytes)
            .with_context(|| format!("[index::store] Failed to decode geometry {id}"))
    }
}
