//! WKB writing operations.

use geo::{LineString, MultiPolygon, Polygon};

use super::{WKB_LE, WKB_MULTIPOLYGON, WKB_POLYGON};

fn push_ring(wkb: &mut Vec<u8>, ring: &LineString<f64>) {
    wkb.extend_from_slice(&(ring.0.len() as u32).to_le_bytes());
    for coord in ring.coords() {
        wkb.extend_from_slice(&coord.x.to_le_bytes());
        wkb.extend_from_slice(&coord.y.to_le_bytes());
    }
}

fn push_polygon(wkb: &mut Vec<u8>, poly: &Polygon<f64>) {
    wkb.push(WKB_LE);
    wkb.extend_from_slice(&WKB_POLYGON.to_le_bytes());
    wkb.extend_from_slice(&((1 + poly.interiors().len()) as u32).to_le_bytes());
    push_ring(wkb, poly.exterior());
    for interior in poly.interiors() {
        push_ring(wkb, interior);
    }
}

/// Encode a MultiPolygon as little-endian WKB.
pub(crate) fn multipolygon_to_wkb(mp: &MultiPolygon<f64>) -> Vec<u8> {
    let mut wkb = Vec::new();
    wkb.push(WKB_LE);
    wkb.extend_from_slice(&WKB_MULTIPOLYGON.to_le_bytes());
    wkb.extend_from_slice(&(mp.0.len() as u32).to_le_bytes());
    for poly in &mp.0 {
        push_polygon(&mut wkb, poly);
    }
    wkb
}

/// Encode a MultiPolygon as a hex WKB string (parquet-friendly).
pub(crate) fn multipolygon_to_hex(mp: &MultiPolygon<f64>) -> String {
    hex::encode(multipolygon_to_wkb(mp))
}
