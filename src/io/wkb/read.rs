//! WKB reading operations.

use std::io::{Cursor, Read};

use anyhow::{bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};

use super::{WKB_LE, WKB_MULTIPOLYGON, WKB_POLYGON};

struct WkbCursor<'a> {
    cursor: Cursor<&'a [u8]>,
    is_le: bool,
}

impl<'a> WkbCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self { Self { cursor: Cursor::new(bytes), is_le: true } }

    fn byte_order(&mut self) -> Result<()> {
        let mut byte_order = [0u8; 1];
        self.cursor.read_exact(&mut byte_order)
            .context("[io::wkb::read] Failed to read byte order")?;
        self.is_le = byte_order[0] == WKB_LE;
        Ok(())
    }

    fn u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.cursor.read_exact(&mut buf)
            .context("[io::wkb::read] Failed to read u32")?;
        Ok(if self.is_le { u32::from_le_bytes(buf) } else { u32::from_be_bytes(buf) })
    }

    fn f64(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.cursor.read_exact(&mut buf)
            .context("[io::wkb::read] Failed to read coordinate")?;
        Ok(if self.is_le { f64::from_le_bytes(buf) } else { f64::from_be_bytes(buf) })
    }

    fn ring(&mut self) -> Result<LineString<f64>> {
        let len = self.u32()? as usize;
        let mut coords = Vec::with_capacity(len);
        for _ in 0..len {
            let x = self.f64()?;
            let y = self.f64()?;
            coords.push(Coord { x, y });
        }
        Ok(LineString::from(coords))
    }

    fn polygon(&mut self) -> Result<Polygon<f64>> {
        self.byte_order()?;
        let geom_type = self.u32()?;
        if geom_type != WKB_POLYGON {
            bail!("[io::wkb::read] Expected Polygon geometry type, got {}", geom_type);
        }
        let num_rings = self.u32()?;
        if num_rings == 0 {
            bail!("[io::wkb::read] Polygon must have at least one ring");
        }
        let exterior = self.ring()?;
        let interiors = (1..num_rings).map(|_| self.ring()).collect::<Result<Vec<_>>>()?;
        Ok(Polygon::new(exterior, interiors))
    }
}

/// Decode little- or big-endian WKB holding a MultiPolygon (or a lone Polygon).
pub(crate) fn multipolygon_from_wkb(bytes: &[u8]) -> Result<MultiPolygon<f64>> {
    let mut reader = WkbCursor::new(bytes);
    reader.byte_order()?;
    match reader.u32()? {
        WKB_MULTIPOLYGON => {
            let count = reader.u32()?;
            let polys = (0..count).map(|_| reader.polygon()).collect::<Result<Vec<_>>>()?;
            Ok(MultiPolygon(polys))
        }
        WKB_POLYGON => {
            reader.cursor.set_position(0);
            Ok(MultiPolygon(vec![reader.polygon()?]))
        }
        other => bail!("[io::wkb::read] Expected (Multi)Polygon geometry type, got {}", other),
    }
}

/// Decode a hex WKB string.
pub(crate) fn multipolygon_from_hex(text: &str) -> Result<MultiPolygon<f64>> {
    let bytes = hex::decode(text.trim()).context("[io::wkb::read] Invalid hex WKB")?;
    multipolygon_from_wkb(&bytes)
}
