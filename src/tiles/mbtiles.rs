use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::geom::TileCoord;
use crate::tiles::{TileMetadata, TileSink};

const SCHEMA: &str = "
    CREATE TABLE metadata (name TEXT NOT NULL, value TEXT);
    CREATE UNIQUE INDEX metadata_name ON metadata (name);
    CREATE TABLE tiles (
        zoom_level INTEGER NOT NULL,
        tile_column INTEGER NOT NULL,
        tile_row INTEGER NOT NULL,
        tile_data BLOB NOT NULL
    );
    CREATE UNIQUE INDEX tile_index ON tiles (zoom_level, tile_column, tile_row);
";

/// MBTiles 1.3 writer. Rows use the TMS scheme; all writes share one
/// transaction that `finish` commits along with the metadata table.
pub struct MbtilesSink {
    conn: Connection,
    metadata: TileMetadata,
    tile_count: usize,
    finished: bool,
}

impl MbtilesSink {
    pub fn create(path: &Path, metadata: TileMetadata) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("[tiles::mbtiles] failed to create {}", path.display()))?;
        conn.execute_batch(SCHEMA).context("[tiles::mbtiles] failed to create schema")?;
        conn.execute_batch("BEGIN").context("[tiles::mbtiles] begin transaction")?;
        Ok(Self { conn, metadata, tile_count: 0, finished: false })
    }

    fn metadata_rows(&self) -> Vec<(&'static str, String)> {
        let m = &self.metadata;
        let (center_x, center_y) = m.center();
        let json = serde_json::json!({ "vector_layers": m.vector_layers() });
        vec![
            ("name", m.name.clone()),
            ("format", "pbf".to_string()),
            ("type", "overlay".to_string()),
            ("version", "1.3".to_string()),
            ("minzoom", m.min_zoom.to_string()),
            ("maxzoom", m.max_zoom.to_string()),
            ("bounds", format!("{},{},{},{}", m.bound.min_x, m.bound.min_y, m.bound.max_x, m.bound.max_y)),
            ("center", format!("{center_x},{center_y},{}", m.min_zoom)),
            ("json", json.to_string()),
        ]
    }
}

impl TileSink for MbtilesSink {
    fn put_tile(&mut self, coord: TileCoord, bytes: &[u8]) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO tiles (zoom_level, tile_column, tile_row, tile_data) VALUES (?1, ?2, ?3, ?4)",
                params![coord.z, coord.x, coord.tms_row(), bytes],
            )
            .with_context(|| format!("[tiles::mbtiles] insert tile {coord}"))?;
        self.tile_count += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        for (name, value) in self.metadata_rows() {
            self.conn
                .execute("INSERT OR REPLACE INTO metadata (name, value) VALUES (?1, ?2)", params![name, value])
                .with_context(|| format!("[tiles::mbtiles] insert metadata {name}"))?;
        }
        self.conn.execute_batch("COMMIT").context("[tiles::mbtiles] commit")?;
        self.finished = true;
        log::debug!("[tiles::mbtiles] committed {} tile writes", self.tile_count);
        Ok(())
    }
}
