use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::geom::TileCoord;

/// Coordinate extent of an encoded vector tile.
pub const EXTENT: u32 = 4096;

/// Every knob that shapes a pyramid. Two runs with equal settings over the
/// same input produce the same tiles, and share a tileset id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Core raster side in pixels.
    pub raster_size: u32,
    /// Padding around each tile, in tile extent units (out of 4096).
    pub padding: u32,
    /// Radius of the square majority filter, in pixels.
    pub convolution_radius: u32,
    /// Traced paths enclosing this many pixels or fewer are dropped.
    pub turd_size: u32,
    /// Foreground cut-off as a fraction of 255.
    pub threshold: f64,
    /// Douglas-Peucker tolerance in pixels.
    pub simplification_tolerance: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_zoom: 0,
            max_zoom: 10,
            raster_size: 1024,
            padding: 128,
            convolution_radius: 4,
            turd_size: 1,
            threshold: 0.5,
            simplification_tolerance: 1.0,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &std::path::Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("[tileset::settings] Failed to read {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("[tileset::settings] Failed to parse {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_zoom > self.max_zoom {
            bail!("min zoom {} is above max zoom {}", self.min_zoom, self.max_zoom);
        }
        if self.max_zoom > crate::geom::MAX_ZOOM {
            bail!("max zoom {} is above the supported {}", self.max_zoom, crate::geom::MAX_ZOOM);
        }
        if self.raster_size == 0 || self.raster_size % 2 != 0 {
            bail!("raster size must be a positive even number, got {}", self.raster_size);
        }
        if (self.padding as u64 * self.raster_size as u64) % EXTENT as u64 != 0 {
            bail!(
                "padding {} does not map to a whole number of pixels at raster size {}",
                self.padding,
                self.raster_size
            );
        }
        if self.padding_pixels() > self.raster_size as usize / 2 {
            bail!("padding {} is wider than half a tile", self.padding);
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            bail!("threshold must be within [0, 1], got {}", self.threshold);
        }
        if !(self.simplification_tolerance >= 0.0) {
            bail!("simplification tolerance must be non-negative, got {}", self.simplification_tolerance);
        }
        Ok(())
    }

    /// Padding width in raster pixels.
    pub fn padding_pixels(&self) -> usize {
        (self.padding as u64 * self.raster_size as u64 / EXTENT as u64) as usize
    }

    /// Padding as a fraction of the tile width.
    pub fn padding_fraction(&self) -> f64 {
        self.padding as f64 / EXTENT as f64
    }

    /// Whether rasters for `coord` feed a coarser zoom and so belong in the cache.
    pub fn caches(&self, coord: TileCoord) -> bool {
        coord.z > self.min_zoom
    }

    /// Stable id: hex of the first 8 bytes of SHA-256 over the settings' JSON.
    pub fn id(&self) -> Result<String> {
        let json = serde_json::to_vec(self).context("[tileset::settings] Failed to serialize settings")?;
        let digest = Sha256::digest(&json);
        Ok(hex::encode(&digest[..8]))
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.padding_pixels(), 32);
        assert!(settings.caches(crate::geom::TileCoord::new(10, 0, 0)));
        assert!(!settings.caches(crate::geom::TileCoord::new(0, 0, 0)));
    }

    #[test]
    fn id_is_stable_and_tracks_every_field() {
        let a = Settings::default();
        let b = Settings::default();
        assert_eq!(a.id().unwrap(), b.id().unwrap());
        assert_eq!(a.id().unwrap().len(), 16);

        let c = Settings { simplification_tolerance: 2.0, ..Settings::default() };
        assert_ne!(a.id().unwrap(), c.id().unwrap());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"max_zoom": 6, "convolution_radius": 2}"#).unwrap();
        assert_eq!(settings.max_zoom, 6);
        assert_eq!(settings.convolution_radius, 2);
        assert_eq!(settings.raster_size, 1024);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let bad = [
            Settings { min_zoom: 5, max_zoom: 4, ..Settings::default() },
            Settings { max_zoom: 30, ..Settings::default() },
            Settings { raster_size: 1023, ..Settings::default() },
            Settings { raster_size: 1000, ..Settings::default() },
            Settings { padding: 4000, ..Settings::default() },
            Settings { threshold: 1.5, ..Settings::default() },
            Settings { simplification_tolerance: -1.0, ..Settings::default() },
        ];
        for settings in bad {
            assert!(settings.validate().is_err(), "{settings:?} should be rejected");
        }
    }
}
