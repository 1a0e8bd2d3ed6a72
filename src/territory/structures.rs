//! Building-footprint points joined to BA shapes: floor area per (BA, tract).

use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use geo::{Contains, Point};
use polars::{frame::DataFrame, prelude::Column};
use rstar::{RTree, AABB};
use tracing::info;

use crate::io;
use crate::territory::polygon::{BaShape, BoundingBox};
use crate::territory::project::EqualArea;

pub const HEIGHT: &str = "HEIGHT";
pub const SQFEET: &str = "SQFEET";
pub const OCC_CLS: &str = "OCC_CLS";
pub const CENSUSCODE: &str = "CENSUSCODE";
pub const BA_CODE_COLUMN: &str = "BA-Code";

/// Storey height (m) assumed when a structure has none.
pub const DEFAULT_HEIGHT: f64 = 3.048;

/// Floor-area sector of an occupancy class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Sector {
    Commercial = 0,
    Residential = 1,
    Industrial = 2,
}

impl Sector {
    pub const ALL: [Sector; 3] = [Sector::Commercial, Sector::Residential, Sector::Industrial];

    pub fn to_str(&self) -> &'static str {
        match self {
            Sector::Commercial => "Commercial",
            Sector::Residential => "Residential",
            Sector::Industrial => "Industrial",
        }
    }

    /// Sector of a structure occupancy class; utility and unclassified structures have none.
    pub fn of_occupancy(class: &str) -> Option<Sector> {
        match class.trim() {
            "Residential" => Some(Sector::Residential),
            "Industrial" | "Agriculture" => Some(Sector::Industrial),
            "Commercial" | "Education" | "Government" | "Assembly" => Some(Sector::Commercial),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub point: Point<f64>,
    pub height: Option<f64>,
    pub sqfeet: f64,
    pub occupancy: String,
    pub census_code: String,
}

impl Structure {
    /// Footprint area scaled by storey count.
    pub fn floor_area(&self) -> f64 {
        let height = self.height.filter(|h| h.is_finite() && *h > 0.0).unwrap_or(DEFAULT_HEIGHT);
        self.sqfeet * (height / DEFAULT_HEIGHT)
    }
}

/// Read structure points, projecting them when the file is in lon/lat.
pub fn read_structures(path: &Path, projector: &EqualArea) -> Result<Vec<Structure>> {
    let geographic = io::shp::is_geographic(path);
    io::shp::read_shapefile(path)?.into_iter()
        .map(|(shape, record)| {
            let point = io::shp::shape_to_point(shape)?;
            let point = if geographic { projector.point(point)? } else { point };
            Ok(Structure {
                point,
                height: io::shp::numeric_field(&record, HEIGHT),
                sqfeet: io::shp::numeric_field(&record, SQFEET).unwrap_or(0.0),
                occupancy: io::shp::character_field(&record, OCC_CLS).unwrap_or_default(),
                census_code: io::shp::character_field(&record, CENSUSCODE)
                    .with_context(|| format!("[territory::structures] structure without {CENSUSCODE}"))?,
            })
        })
        .collect()
}

/// Floor area by sector for every (BA code, census tract) pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaTractArea {
    rows: BTreeMap<(String, String), [f64; 3]>,
}

impl BaTractArea {
    /// Assign each structure to the BA shape containing it and accumulate floor area.
    /// Structures outside every shape, or without a sector, are skipped and counted.
    pub fn from_structures(shapes: &[BaShape], structures: &[Structure]) -> Self {
        let rtree = RTree::bulk_load(BoundingBox::of_all(shapes.iter().map(|s| &s.geometry)));
        let mut rows = BTreeMap::<(String, String), [f64; 3]>::new();
        let (mut outside, mut unclassified) = (0usize, 0usize);

        for structure in structures {
            let Some(sector) = Sector::of_occupancy(&structure.occupancy) else {
                unclassified += 1;
                continue;
            };
            let xy = [structure.point.x(), structure.point.y()];
            let hit = rtree.locate_in_envelope_intersecting(&AABB::from_point(xy))
                .map(BoundingBox::idx)
                .filter(|&i| shapes[i].geometry.contains(&structure.point))
                .min();
            let Some(i) = hit else {
                outside += 1;
                continue;
            };
            let key = (shapes[i].ba_code.clone(), structure.census_code.clone());
            rows.entry(key).or_insert([0.0; 3])[sector as usize] += structure.floor_area();
        }

        info!(pairs = rows.len(), outside, unclassified, "joined structures to BA shapes");
        Self { rows }
    }

    pub fn from_rows(rows: impl IntoIterator<Item = ((String, String), [f64; 3])>) -> Self {
        Self { rows: rows.into_iter().collect() }
    }

    /// Floor area of one sector at (BA, tract).
    pub fn area(&self, ba: &str, tract: &str, sector: Sector) -> f64 {
        self.rows.get(&(ba.to_string(), tract.to_string())).map_or(0.0, |r| r[sector as usize])
    }

    /// (BA, tract, [commercial, residential, industrial]) in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &[f64; 3])> {
        self.rows.iter().map(|((ba, tract), areas)| (ba.as_str(), tract.as_str(), areas))
    }

    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![
            Column::new(BA_CODE_COLUMN.into(), self.rows.keys().map(|k| k.0.clone()).collect::<Vec<_>>()),
            Column::new(CENSUSCODE.into(), self.rows.keys().map(|k| k.1.clone()).collect::<Vec<_>>()),
        ];
        for sector in Sector::ALL {
            columns.push(Column::new(
                sector.to_str().into(),
                self.rows.values().map(|r| r[sector as usize]).collect::<Vec<_>>(),
            ));
        }
        Ok(DataFrame::new(columns)?)
    }

    pub fn write_parquet(&self, path: &Path) -> Result<()> {
        io::parquet::write_parquet(&mut self.to_dataframe()?, path)
    }

    pub fn read_parquet(path: &Path) -> Result<Self> {
        let df = io::parquet::read_parquet(path)?;
        let bas = io::csv::string_column(&df, BA_CODE_COLUMN)?;
        let tracts = io::csv::string_column(&df, CENSUSCODE)?;
        let sectors = Sector::ALL.iter()
            .map(|s| io::parquet::f64_column(&df, s.to_str()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_rows(bas.into_iter().zip(tracts).enumerate()
            .map(|(i, key)| (key, [sectors[0][i], sectors[1][i], sectors[2][i]]))))
    }
}
