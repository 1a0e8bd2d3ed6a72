//! Well-Known Binary encoding for MultiPolygon geometry.
//!
//! Used to persist deoverlapped territories and to compare geometries byte-for-byte.

mod read;
mod write;

pub(crate) use read::*;
pub(crate) use write::*;

/// WKB geometry type for Polygon
const WKB_POLYGON: u32 = 3;
/// WKB geometry type for MultiPolygon
const WKB_MULTIPOLYGON: u32 = 6;
/// WKB byte order: little endian
const WKB_LE: u8 = 1;
