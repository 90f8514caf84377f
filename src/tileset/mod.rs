//! Tileset identity: the settings a pyramid was built with and the manifest that records runs.

mod manifest;
mod settings;

pub use manifest::{Manifest, Telemetry, Tileset};
pub use settings::{EXTENT, Settings};
