use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pmtiles2::util::tile_id;
use pmtiles2::{Compression as PmtilesCompression, PMTiles, TileType};

use crate::geom::TileCoord;
use crate::tiles::{TileMetadata, TileSink};

/// PMTiles v3 writer. The archive directory needs every tile up front, so
/// tiles are held in memory by tile id and the file is written by `finish`.
pub struct PmtilesSink {
    path: PathBuf,
    metadata: TileMetadata,
    tiles: BTreeMap<u64, Vec<u8>>,
    finished: bool,
}

impl PmtilesSink {
    pub fn create(path: &Path, metadata: TileMetadata) -> Result<Self> {
        // Fail early on an unwritable location rather than after rendering.
        File::create(path).with_context(|| format!("[tiles::pmtiles] failed to create {}", path.display()))?;
        Ok(Self { path: path.to_path_buf(), metadata, tiles: BTreeMap::new(), finished: false })
    }
}

impl TileSink for PmtilesSink {
    fn put_tile(&mut self, coord: TileCoord, bytes: &[u8]) -> Result<()> {
        self.tiles.insert(tile_id(coord.z, coord.x as u64, coord.y as u64), bytes.to_vec());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        let m = &self.metadata;
        let mut pm = PMTiles::new(TileType::Mvt, PmtilesCompression::GZip);
        pm.min_zoom = m.min_zoom;
        pm.max_zoom = m.max_zoom;
        pm.min_longitude = m.bound.min_x;
        pm.min_latitude = m.bound.min_y;
        pm.max_longitude = m.bound.max_x;
        pm.max_latitude = m.bound.max_y;
        let (center_lng, center_lat) = m.center();
        pm.center_zoom = m.min_zoom;
        pm.center_longitude = center_lng;
        pm.center_latitude = center_lat;

        pm.meta_data.insert("name".into(), serde_json::json!(m.name));
        pm.meta_data.insert("format".into(), serde_json::json!("pbf"));
        pm.meta_data.insert("type".into(), serde_json::json!("overlay"));
        pm.meta_data.insert("minzoom".into(), serde_json::json!(m.min_zoom));
        pm.meta_data.insert("maxzoom".into(), serde_json::json!(m.max_zoom));
        pm.meta_data.insert("vector_layers".into(), m.vector_layers());

        for (id, bytes) in std::mem::take(&mut self.tiles) {
            pm.add_tile(id, bytes)?;
        }

        let file = File::create(&self.path)
            .with_context(|| format!("[tiles::pmtiles] failed to create {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        pm.to_writer(&mut writer)
            .with_context(|| format!("[tiles::pmtiles] failed to write {}", self.path.display()))?;
        self.finished = true;
        Ok(())
    }
}
