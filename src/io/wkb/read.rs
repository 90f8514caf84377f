//! WKB reading operations.

use anyhow::{Context, Result, bail};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use std::io::{Cursor, Read};

use super::{WKB_BE, WKB_LE, WKB_MULTIPOLYGON, WKB_POLYGON};

fn read_byte_order(cursor: &mut Cursor<&[u8]>) -> Result<bool> {
    let mut byte_order = [0u8; 1];
    cursor.read_exact(&mut byte_order)
        .context("[io::wkb::read] Failed to read byte order")?;
    match byte_order[0] {
        WKB_LE => Ok(true),
        WKB_BE => Ok(false),
        other => bail!("[io::wkb::read] Invalid byte order marker {other}"),
    }
}

fn read_u32(cursor: &mut Cursor<&[u8]>, is_le: bool) -> Result<u32> {
    let mut bytes = [0u8; 4];
    cursor.read_exact(&mut bytes)?;
    Ok(if is_le { u32::from_le_bytes(bytes) } else { u32::from_be_bytes(bytes) })
}

fn read_f64(cursor: &mut Cursor<&[u8]>, is_le: bool) -> Result<f64> {
    let mut bytes = [0u8; 8];
    cursor.read_exact(&mut bytes)?;
    Ok(if is_le { f64::from_le_bytes(bytes) } else { f64::from_be_bytes(bytes) })
}

fn read_ring(cursor: &mut Cursor<&[u8]>, is_le: bool) -> Result<LineString<f64>> {
    let len = read_u32(cursor, is_le).context("[io::wkb::read] Failed to read ring length")?;
    let remaining = cursor.get_ref().len() as u64 - cursor.position();
    if len as u64 * 16 > remaining {
        bail!("[io::wkb::read] Ring of {len} points overruns the buffer");
    }
    let mut coords = Vec::with_capacity(len as usize);
    for _ in 0..len {
        let x = read_f64(cursor, is_le).context("[io::wkb::read] Failed to read x coordinate")?;
        let y = read_f64(cursor, is_le).context("[io::wkb::read] Failed to read y coordinate")?;
        coords.push(Coord { x, y });
    }
    Ok(LineString::from(coords))
}

/// Read a Polygon body (everything after the geometry type).
fn read_polygon_body(cursor: &mut Cursor<&[u8]>, is_le: bool) -> Result<Polygon<f64>> {
    let num_rings = read_u32(cursor, is_le).context("[io::wkb::read] Failed to read number of rings")?;
    if num_rings == 0 {
        bail!("[io::wkb::read] Polygon must have at least one ring");
    }
    let exterior = read_ring(cursor, is_le)?;
    let interiors = (1..num_rings)
        .map(|_| read_ring(cursor, is_le))
        .collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Read a MultiPolygon from WKB. A bare Polygon is accepted as a one-part MultiPolygon.
pub(crate) fn multipolygon_from_wkb(wkb_bytes: &[u8]) -> Result<MultiPolygon<f64>> {
    let mut cursor = Cursor::new(wkb_bytes);
    let is_le = read_byte_order(&mut cursor)?;
    let geom_type = read_u32(&mut cursor, is_le).context("[io::wkb::read] Failed to read geometry type")?;

    match geom_type {
        WKB_POLYGON => Ok(MultiPolygon(vec![read_polygon_body(&mut cursor, is_le)?])),
        WKB_MULTIPOLYGON => {
            let count = read_u32(&mut cursor, is_le)
                .context("[io::wkb::read] Failed to read polygon count")?;
            let mut polygons = Vec::new();
            for _ in 0..count {
                let part_le = read_byte_order(&mut cursor)?;
                let part_type = read_u32(&mut cursor, part_le)
                    .context("[io::wkb::read] Failed to read part geometry type")?;
                if part_type != WKB_POLYGON {
                    bail!("[io::wkb::read] Expected Polygon part, got geometry type {part_type}");
                }
                polygons.push(read_polygon_body(&mut cursor, part_le)?);
            }
            Ok(MultiPolygon(polygons))
        }
        other => bail!("[io::wkb::read] Expected Polygon or MultiPolygon geometry type, got {other}"),
    }
}
