//! Shapefile reading: polygons and points with their attribute records.

use std::path::Path;

use anyhow::{bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Point, Polygon};
use shapefile::{dbase::{FieldValue, Record}, Reader, Shape};

/// Reads all shapes + attribute records from a given `.shp` file path.
pub(crate) fn read_shapefile(path: &Path) -> Result<Vec<(Shape, Record)>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("[io::shp] Failed to open shapefile: {}", path.display()))?;

    let mut items = Vec::with_capacity(reader.shape_count()?);
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.context("[io::shp] Error reading shape+record")?;
        items.push((shape, record));
    }
    Ok(items)
}

/// True when the sidecar `.prj` declares a geographic (lon/lat) CRS, or is absent.
pub(crate) fn is_geographic(path: &Path) -> bool {
    std::fs::read_to_string(path.with_extension("prj"))
        .map(|wkt| wkt.trim_start().starts_with("GEOGCS"))
        .unwrap_or(true)
}

/// Get the value of a character-like field from a Record, trimmed.
pub(crate) fn character_field(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        FieldValue::Character(Some(s)) => Some(s.trim().to_string()),
        FieldValue::Memo(s) => Some(s.trim().to_string()),
        FieldValue::Numeric(Some(n)) => Some(format!("{n}")),
        FieldValue::Integer(i) => Some(i.to_string()),
        _ => None,
    }
}

/// Get the value of a numeric field from a Record.
pub(crate) fn numeric_field(record: &Record, field: &str) -> Option<f64> {
    match record.get(field)? {
        FieldValue::Numeric(n) => *n,
        FieldValue::Float(f) => f.map(f64::from),
        FieldValue::Double(d) => Some(*d),
        FieldValue::Integer(i) => Some(f64::from(*i)),
        FieldValue::Currency(c) => Some(*c),
        FieldValue::Character(Some(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Convert a shapefile ring list to geo::MultiPolygon<f64>.
/// Shapefile stores each clockwise exterior followed by its counter-clockwise holes.
fn rings_to_multipolygon(rings: Vec<Vec<Coord<f64>>>) -> MultiPolygon<f64> {
    /// Get the signed area of a coordinate ring (negative for clockwise)
    fn signed_area(pts: &[Coord<f64>]) -> f64 {
        pts.windows(2).map(|w| w[0].x * w[1].y - w[1].x * w[0].y).sum::<f64>() / 2.0
    }

    let mut polys = Vec::new();
    let mut current_exterior: Option<LineString<f64>> = None;
    let mut current_holes = Vec::new();

    for mut coords in rings {
        if coords.first() != coords.last() {
            if let Some(&first) = coords.first() { coords.push(first) }
        }
        let is_exterior = signed_area(&coords) < 0.0;
        let ring = LineString(coords);
        if is_exterior {
            if let Some(ext) = current_exterior.take() {
                polys.push(Polygon::new(ext, std::mem::take(&mut current_holes)));
            }
            current_exterior = Some(ring);
        } else {
            current_holes.push(ring);
        }
    }
    if let Some(ext) = current_exterior {
        polys.push(Polygon::new(ext, current_holes));
    }

    MultiPolygon(polys)
}

/// Convert a polygon-typed Shape to a MultiPolygon.
pub(crate) fn shape_to_multipolygon(shape: Shape) -> Result<MultiPolygon<f64>> {
    fn collect<P>(rings: &[shapefile::PolygonRing<P>], xy: impl Fn(&P) -> Coord<f64>) -> Vec<Vec<Coord<f64>>> {
        rings.iter().map(|ring| ring.points().iter().map(&xy).collect()).collect()
    }

    Ok(match shape {
        Shape::Polygon(p) => rings_to_multipolygon(collect(p.rings(), |pt| Coord { x: pt.x, y: pt.y })),
        Shape::PolygonM(p) => rings_to_multipolygon(collect(p.rings(), |pt| Coord { x: pt.x, y: pt.y })),
        Shape::PolygonZ(p) => rings_to_multipolygon(collect(p.rings(), |pt| Coord { x: pt.x, y: pt.y })),
        other => bail!("[io::shp] found non-Polygon shape: {:?}", other.shapetype()),
    })
}

/// Convert a point-typed Shape to a Point.
pub(crate) fn shape_to_point(shape: Shape) -> Result<Point<f64>> {
    Ok(match shape {
        Shape::Point(p) => Point::new(p.x, p.y),
        Shape::PointM(p) => Point::new(p.x, p.y),
        Shape::PointZ(p) => Point::new(p.x, p.y),
        other => bail!("[io::shp] found non-Point shape: {:?}", other.shapetype()),
    })
}
