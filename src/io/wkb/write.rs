//! WKB writing operations.

use anyhow::{Context, Result};
use geo::{LineString, MultiPolygon, Polygon};
use std::io::Write;

use super::{WKB_LE, WKB_MULTIPOLYGON, WKB_POLYGON};

fn write_ring(wkb: &mut Vec<u8>, ring: &LineString<f64>) -> Result<()> {
    wkb.write_all(&(ring.0.len() as u32).to_le_bytes())?;
    for coord in ring.coords() {
        wkb.write_all(&coord.x.to_le_bytes())?;
        wkb.write_all(&coord.y.to_le_bytes())?;
    }
    Ok(())
}

/// Write a Polygon, header included, to the end of `wkb`.
fn write_polygon(wkb: &mut Vec<u8>, poly: &Polygon<f64>) -> Result<()> {
    wkb.write_all(&[WKB_LE])?;
    wkb.write_all(&WKB_POLYGON.to_le_bytes())?;

    // Number of rings (1 exterior + interiors)
    let num_rings = (1 + poly.interiors().len()) as u32;
    wkb.write_all(&num_rings.to_le_bytes())?;

    write_ring(wkb, poly.exterior())?;
    for interior in poly.interiors() {
        write_ring(wkb, interior)?;
    }
    Ok(())
}

/// Write a MultiPolygon to little-endian WKB.
pub(crate) fn multipolygon_to_wkb(geometry: &MultiPolygon<f64>) -> Result<Vec<u8>> {
    let mut wkb = Vec::new();
    wkb.write_all(&[WKB_LE])?;
    wkb.write_all(&WKB_MULTIPOLYGON.to_le_bytes())?;
    wkb.write_all(&(geometry.0.len() as u32).to_le_bytes())?;
    for poly in geometry {
        write_polygon(&mut wkb, poly)
            .context("[io::wkb::write] Failed to convert polygon to WKB")?;
    }
    Ok(wkb)
}
