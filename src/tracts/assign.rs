use std::path::Path;

use anyhow::Result;
use rand::Rng;
use tracing::{info, warn};

use crate::{config::TractConfig, io};
use crate::error::{StockError, StockResult};
use crate::geography::{is_valid_tract, join_tract};
use crate::sampling::Stock;
use crate::tracts::cumulative::CumulativeTable;

pub const BUILDING_TYPE: &str = "building_type";
pub const COUNTY: &str = "county";
pub const TRACT: &str = "tract";
pub const ASSIGNMENT_LEVEL: &str = "assignment_level";

/// How a row obtained its tract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssignmentLevel {
    Original = 0,
    BuildingTypeCounty = 1,
    County = 2,
    CensusList = 3,
    Unassigned = 4,
}

/// Row counts per assignment level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentReport {
    pub levels: [usize; 5],
}

impl AssignmentReport {
    #[inline] pub fn unassigned(&self) -> usize { self.levels[AssignmentLevel::Unassigned as usize] }

    #[inline] pub fn total(&self) -> usize { self.levels.iter().sum() }

    /// Fraction of rows left without a tract.
    pub fn unassigned_fraction(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => self.unassigned() as f64 / n as f64,
        }
    }
}

/// Fills missing tracts from three fallback distributions:
/// P(tract | building_type, county) and P(tract | county) over rows with a valid tract,
/// then a uniform draw from an external census tract list.
#[derive(Debug, Clone)]
pub struct TractAssigner {
    by_type_county: CumulativeTable<(String, String)>,
    by_county: CumulativeTable<String>,
    census: CumulativeTable<String>,
}

impl TractAssigner {
    /// Fit the first two levels on the stock's valid-tract rows; `census` lists (county, tract).
    pub fn fit(stock: &Stock, census: &[(String, String)]) -> StockResult<Self> {
        let (types, counties, tracts) = columns(stock)?;
        let valid = (0..stock.len()).filter(|&i| is_valid_tract(&tracts[i])).collect::<Vec<_>>();

        Ok(Self {
            by_type_county: CumulativeTable::from_observations(
                valid.iter().map(|&i| ((types[i].clone(), counties[i].clone()), tracts[i].as_str()))
            ),
            by_county: CumulativeTable::from_observations(
                valid.iter().map(|&i| (counties[i].clone(), tracts[i].as_str()))
            ),
            census: CumulativeTable::from_observations(
                census.iter().map(|(county, tract)| (county.clone(), tract.as_str()))
            ),
        })
    }

    /// Read the census list CSV (`county`, `tract`, `last6`); a tract that is not a full id
    /// is rebuilt from its county and `last6`.
    pub fn read_census_list(path: &Path) -> Result<Vec<(String, String)>> {
        let df = io::csv::read_csv_strings(path)?;
        let counties = io::csv::string_column(&df, "county")?;
        let tracts = io::csv::string_column(&df, "tract")?;
        let last6 = io::csv::string_column(&df, "last6")?;
        Ok(counties.into_iter().zip(tracts).zip(last6)
            .map(|((county, tract), last6)| {
                let tract = if is_valid_tract(&tract) { tract } else { join_tract(&county, &last6) };
                (county, tract)
            })
            .collect())
    }

    /// Pick a tract for one row, trying each level in turn.
    pub fn pick(&self, building_type: &str, county: &str, u: f64) -> (Option<&str>, AssignmentLevel) {
        let key = (building_type.to_string(), county.to_string());
        if let Some(tract) = self.by_type_county.pick(&key, u) {
            return (Some(tract), AssignmentLevel::BuildingTypeCounty);
        }
        let county = key.1;
        if let Some(tract) = self.by_county.pick(&county, u) {
            return (Some(tract), AssignmentLevel::County);
        }
        if let Some(tract) = self.census.pick(&county, u) {
            return (Some(tract), AssignmentLevel::CensusList);
        }
        (None, AssignmentLevel::Unassigned)
    }

    /// Assign every row with a missing tract, drawing one uniform per such row in row order.
    /// Adds an `assignment_level` column; unassigned rows keep their placeholder.
    pub fn assign(&self, stock: &mut Stock, rng: &mut impl Rng) -> StockResult<AssignmentReport> {
        let (types, counties, tracts) = columns(stock)?;
        let mut report = AssignmentReport::default();
        let mut assigned = Vec::with_capacity(stock.len());
        let mut levels = Vec::with_capacity(stock.len());

        for i in 0..stock.len() {
            let (tract, level) = if is_valid_tract(&tracts[i]) {
                (tracts[i].clone(), AssignmentLevel::Original)
            } else {
                let u = rng.random::<f64>();
                match self.pick(&types[i], &counties[i], u) {
                    (Some(tract), level) => (tract.to_string(), level),
                    (None, level) => (tracts[i].clone(), level),
                }
            };
            report.levels[level as usize] += 1;
            assigned.push(tract);
            levels.push((level as u8).to_string());
        }

        stock.set_column(TRACT, assigned);
        stock.set_column(ASSIGNMENT_LEVEL, levels);
        info!(levels = ?report.levels, "tract assignment complete");
        Ok(report)
    }

    /// [`TractAssigner::assign`] followed by the configured unassigned-row policy:
    /// leftover rows are a warning unless `fail_on_missing` is set and their share
    /// exceeds `tolerance`.
    pub fn assign_checked(&self, stock: &mut Stock, rng: &mut impl Rng, config: &TractConfig) -> StockResult<AssignmentReport> {
        let report = self.assign(stock, rng)?;
        let count = report.unassigned();
        if count > 0 {
            warn!("{}", StockError::TractAssignmentFailure { count });
            if config.fail_on_missing && report.unassigned_fraction() > config.tolerance {
                return Err(StockError::TractAssignmentFailure { count });
            }
        }
        Ok(report)
    }
}

fn columns(stock: &Stock) -> StockResult<(Vec<String>, Vec<String>, Vec<String>)> {
    let get = |name: &str| stock.column(name)
        .map(<[String]>::to_vec)
        .ok_or_else(|| StockError::Data(format!("stock has no `{name}` column")));
    Ok((get(BUILDING_TYPE)?, get(COUNTY)?, get(TRACT)?))
}
