use anyhow::{Context, Result, anyhow, bail};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;

/// Parse one input record: a GeoJSON `Polygon` or `MultiPolygon` geometry,
/// either bare or wrapped in a `Feature`. Polygons come back as one-part
/// MultiPolygons.
pub(crate) fn parse_geometry(bytes: &[u8]) -> Result<MultiPolygon<f64>> {
    let value: Value = serde_json::from_slice(bytes).context("Failed to parse GeoJSON record")?;
    let geometry = match value["type"].as_str() {
        Some("Feature") => &value["geometry"],
        _ => &value,
    };
    let coords = || {
        geometry["coordinates"]
            .as_array()
            .ok_or_else(|| anyhow!("Invalid geometry: missing \"coordinates\" array"))
    };

    match geometry["type"].as_str() {
        Some("Polygon") => Ok(MultiPolygon(vec![parse_polygon_coords(coords()?)?])),
        Some("MultiPolygon") => coords()?
            .iter()
            .map(|polygon| {
                polygon
                    .as_array()
                    .ok_or_else(|| anyhow!("Invalid MultiPolygon: polygon is not an array"))
                    .and_then(|rings| parse_polygon_coords(rings))
            })
            .collect::<Result<Vec<_>>>()
            .map(MultiPolygon),
        Some(other) => bail!("Unsupported geometry type {other:?}; expected Polygon or MultiPolygon"),
        None => bail!("Invalid geometry: missing \"type\""),
    }
}

/// Parse GeoJSON Polygon coordinates: `[exterior, hole, hole, ...]`.
fn parse_polygon_coords(rings: &[Value]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| {
        ring.as_array()
            .ok_or_else(|| anyhow!("Invalid Polygon: ring is not an array"))
            .and_then(|coords| parse_ring_coords(coords))
    });
    let exterior = rings.next().ok_or_else(|| anyhow!("Invalid Polygon: missing exterior ring"))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Parse a ring (exterior or interior) from GeoJSON coordinates.
/// Format: [[x, y], [x, y], ...]
fn parse_ring_coords(coords: &[Value]) -> Result<LineString<f64>> {
    let mut points = Vec::with_capacity(coords.len());

    for coord_pair in coords {
        let coord_array = coord_pair.as_array()
            .filter(|array| array.len() >= 2)
            .ok_or_else(|| anyhow!("Invalid coordinate: expected [x, y]"))?;
        let x = coord_array[0].as_f64()
            .ok_or_else(|| anyhow!("Invalid coordinate: x must be a number"))?;
        let y = coord_array[1].as_f64()
            .ok_or_else(|| anyhow!("Invalid coordinate: y must be a number"))?;
        points.push(Coord { x, y });
    }

    // Ensure ring is closed (first point == last point)
    if !points.is_empty() && points[0] != points[points.len() - 1] {
        points.push(points[0]);
    }

    Ok(LineString(points))
}

#[cfg(test)]
mod tests {
    use super::parse_geometry;

    #[test]
    fn polygon_becomes_single_part() {
        let geometry = parse_geometry(br#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#).unwrap();
        assert_eq!(geometry.0.len(), 1);
        assert_eq!(geometry.0[0].exterior().0.len(), 4);
    }

    #[test]
    fn feature_wrapper_and_open_rings_are_accepted() {
        let record = br#"{"type":"Feature","properties":{"kind":"forest"},"geometry":{"type":"MultiPolygon","coordinates":[[[[0,0],[2,0],[2,2],[0,2]],[[0.5,0.5],[1,0.5],[1,1]]],[[[5,5],[6,5],[6,6]]]]}}"#;
        let geometry = parse_geometry(record).unwrap();
        assert_eq!(geometry.0.len(), 2);
        assert_eq!(geometry.0[0].interiors().len(), 1);
        assert!(geometry.0[0].exterior().is_closed());
    }

    #[test]
    fn other_geometry_types_are_rejected() {
        assert!(parse_geometry(br#"{"type":"Point","coordinates":[1,2]}"#).is_err());
        assert!(parse_geometry(br#"{"type":"Polygon","coordinates":[[[0,0],["a",1]]]}"#).is_err());
        assert!(parse_geometry(b"not json").is_err());
    }
}
