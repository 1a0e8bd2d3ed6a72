use std::path::Path;

use anyhow::{Context, Result};
use geo::{BoundingRect, MultiPolygon, Rect};
use rstar::{RTreeObject, AABB};
use shapefile::dbase::Record;

use crate::io;

/// Territory shapefile attributes.
pub const NAME: &str = "NAME";
pub const ID: &str = "ID";
pub const STATE: &str = "STATE";

/// State boundary attribute holding the postal abbreviation.
pub const STATE_ABBR: &str = "STUSPS";

/// A utility territory as read, before any cleaning.
#[derive(Debug, Clone)]
pub struct RawTerritory {
    pub utility_id: String,
    pub name: String,
    pub state: String,
    pub geometry: MultiPolygon<f64>,
}

/// A cleaned, single-state utility territory in projected coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Territory {
    pub utility_id: u32,
    pub name: String,
    pub state: String,
    pub ba_code: String,
    pub customers: f64,
    /// Area in m² of the projected geometry.
    pub area: f64,
    pub geometry: MultiPolygon<f64>,
}

impl Territory {
    /// Customers per m².
    #[inline] pub fn density(&self) -> f64 {
        if self.area > 0.0 { self.customers / self.area } else { 0.0 }
    }
}

/// Dissolved balancing-authority footprint within one state.
#[derive(Debug, Clone, PartialEq)]
pub struct BaShape {
    pub state: String,
    pub ba_code: String,
    pub geometry: MultiPolygon<f64>,
}

#[derive(Debug, Clone)]
pub struct StateBoundary {
    pub state: String,
    pub geometry: MultiPolygon<f64>,
}

/// A bounding box in an R-tree, associated with a geometry by index.
#[derive(Debug, Clone)]
pub(crate) struct BoundingBox {
    idx: usize,
    bbox: Rect<f64>,
}

impl BoundingBox {
    /// Boxes for every geometry that has one, in input order.
    pub(crate) fn of_all<'a>(geoms: impl IntoIterator<Item = &'a MultiPolygon<f64>>) -> Vec<Self> {
        geoms.into_iter().enumerate()
            .filter_map(|(idx, g)| g.bounding_rect().map(|bbox| Self { idx, bbox }))
            .collect()
    }

    #[inline] pub(crate) fn idx(&self) -> usize { self.idx }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Search envelope of a geometry's bounding box.
pub(crate) fn envelope_of(geometry: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    geometry.bounding_rect().map(|r| AABB::from_corners(r.min().into(), r.max().into()))
}

/// Read utility territories from a polygon shapefile.
pub fn read_territories(path: &Path) -> Result<Vec<RawTerritory>> {
    let text = |record: &Record, field: &str| io::shp::character_field(record, field).unwrap_or_default();
    io::shp::read_shapefile(path)?.into_iter()
        .map(|(shape, record)| Ok(RawTerritory {
            utility_id: text(&record, ID),
            name: text(&record, NAME),
            state: text(&record, STATE),
            geometry: io::shp::shape_to_multipolygon(shape)
                .with_context(|| format!("[territory::read] bad geometry in {}", path.display()))?,
        }))
        .collect()
}

/// Read state boundaries from a polygon shapefile keyed by `STUSPS`.
pub fn read_states(path: &Path) -> Result<Vec<StateBoundary>> {
    io::shp::read_shapefile(path)?.into_iter()
        .map(|(shape, record)| Ok(StateBoundary {
            state: io::shp::character_field(&record, STATE_ABBR)
                .with_context(|| format!("[territory::read] state without {STATE_ABBR} in {}", path.display()))?,
            geometry: io::shp::shape_to_multipolygon(shape)?,
        }))
        .collect()
}
