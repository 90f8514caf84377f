//! Minimal Well-Known Binary codec for (multi)polygons.

mod read;
mod write;

pub(crate) use read::multipolygon_from_wkb;
pub(crate) use write::multipolygon_to_wkb;

/// WKB byte order: little endian
const WKB_LE: u8 = 1;
/// WKB byte order: big endian
const WKB_BE: u8 = 0;
/// WKB geometry type for Polygon
const WKB_POLYGON: u32 = 3;
/// WKB geometry type for MultiPolygon
const WKB_MULTIPOLYGON: u32 = 6;

#[cfg(test)]
mod tests {
    use super::{multipolygon_from_wkb, multipolygon_to_wkb};
    use geo::{LineString, MultiPolygon, Polygon, polygon};

    #[test]
    fn keeps_holes_and_parts() {
        let outer = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 2.0, y: 2.0), (x: 4.0, y: 2.0), (x: 4.0, y: 4.0), (x: 2.0, y: 4.0)]]
        );
        let island = polygon![(x: 20.5, y: -1.25), (x: 21.0, y: -1.25), (x: 21.0, y: 0.0)];
        let geometry = MultiPolygon(vec![outer, island]);

        let bytes = multipolygon_to_wkb(&geometry).unwrap();
        assert_eq!(bytes[0], 1);
        assert_eq!(u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]), 6);
        assert_eq!(multipolygon_from_wkb(&bytes).unwrap(), geometry);
    }

    #[test]
    fn reads_big_endian_polygon() {
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(&3u32.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&4u32.to_be_bytes());
        for (x, y) in [(0.0f64, 0.0f64), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)] {
            bytes.extend_from_slice(&x.to_be_bytes());
            bytes.extend_from_slice(&y.to_be_bytes());
        }
        let expected = Polygon::new(LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]), vec![]);
        assert_eq!(multipolygon_from_wkb(&bytes).unwrap(), MultiPolygon(vec![expected]));
    }

    #[test]
    fn rejects_truncated_and_foreign_types() {
        let geometry = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)]]);
        let bytes = multipolygon_to_wkb(&geometry).unwrap();
        assert!(multipolygon_from_wkb(&bytes[..bytes.len() - 3]).is_err());

        let mut point = vec![1u8];
        point.extend_from_slice(&1u32.to_le_bytes());
        point.extend_from_slice(&0f64.to_le_bytes());
        point.extend_from_slice(&0f64.to_le_bytes());
        assert!(multipolygon_from_wkb(&point).is_err());
    }
}
