use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::common::write_atomic;
use crate::tileset::Settings;

/// What one run of the pipeline produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Tiles written to the container.
    pub tile_count: usize,
    /// Tiles whose rendering failed.
    #[serde(default)]
    pub failed_count: usize,
    /// Wall-clock seconds.
    pub time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tileset {
    pub id: String,
    pub settings: Settings,
    pub telemetry: Telemetry,
}

/// The `tilesets.json` registry in an output directory, one entry per tileset id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    tilesets: Vec<Tileset>,
}

impl Manifest {
    pub const FILE_NAME: &'static str = "tilesets.json";

    /// Load the manifest at `path`; a missing file is an empty manifest.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let bytes = std::fs::read(path)
            .with_context(|| format!("[tileset::manifest] Failed to read {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("[tileset::manifest] Failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)
            .context("[tileset::manifest] Failed to serialize manifest")?;
        write_atomic(path, &json)
    }

    /// Insert `tileset`, replacing any entry with the same id in place.
    pub fn upsert(&mut self, tileset: Tileset) {
        match self.tilesets.iter_mut().find(|entry| entry.id == tileset.id) {
            Some(entry) => *entry = tileset,
            None => self.tilesets.push(tileset),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Tileset> {
        self.tilesets.iter().find(|entry| entry.id == id)
    }

    pub fn tilesets(&self) -> &[Tileset] { &self.tilesets }
}

#[cfg(test)]
mod tests {
    use super::{Manifest, Telemetry, Tileset};
    use crate::tileset::Settings;

    fn tileset(settings: Settings, tile_count: usize) -> Tileset {
        Tileset {
            id: settings.id().unwrap(),
            settings,
            telemetry: Telemetry { tile_count, failed_count: 0, time: 1.5 },
        }
    }

    #[test]
    fn upsert_replaces_entries_with_the_same_id() {
        let mut manifest = Manifest::default();
        manifest.upsert(tileset(Settings::default(), 10));
        manifest.upsert(tileset(Settings { max_zoom: 4, ..Settings::default() }, 3));
        manifest.upsert(tileset(Settings::default(), 12));

        assert_eq!(manifest.tilesets().len(), 2);
        assert_eq!(manifest.tilesets()[0].telemetry.tile_count, 12);
    }

    #[test]
    fn save_and_load_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(Manifest::FILE_NAME);
        assert_eq!(Manifest::load(&path).unwrap(), Manifest::default());

        let mut manifest = Manifest::default();
        manifest.upsert(tileset(Settings::default(), 7));
        manifest.save(&path).unwrap();

        let loaded = Manifest::load(&path).unwrap();
        let id = Settings::default().id().unwrap();
        assert_eq!(loaded.get(&id).map(|t| t.telemetry.tile_count), Some(7));
        let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(raw.is_array());
    }
}
