//! Normalized Web Mercator.
//!
//! Both axes map to `[0, 1]` with the origin at the north-west corner of the
//! world square, so `y` grows southward like tile rows do.

use std::f64::consts::PI;

use geo::Coord;

/// Project a `(lng, lat)` coordinate in degrees to normalized mercator.
pub fn lng_lat_to_mercator(lng_lat: Coord<f64>) -> Coord<f64> {
    let x = (180.0 + lng_lat.x) / 360.0;
    let y = (180.0 - (180.0 / PI) * (PI / 4.0 + lng_lat.y * PI / 360.0).tan().ln()) / 360.0;
    Coord { x, y }
}

/// Inverse of [`lng_lat_to_mercator`].
pub fn mercator_to_lng_lat(point: Coord<f64>) -> Coord<f64> {
    let y = 180.0 - point.y * 360.0;
    Coord {
        x: point.x * 360.0 - 180.0,
        y: (360.0 / PI) * (y * PI / 180.0).exp().atan() - 90.0,
    }
}
