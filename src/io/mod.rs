//! Format-specific reading and writing.
//!
//! - `geojson` - one GeoJSON geometry or Feature per input record
//! - `wkb` - Well-Known Binary for the on-disk geometry store

pub(crate) mod geojson;
pub(crate) mod wkb;
