//! Per-BA county allocation weights.

use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, prelude::Column};

use crate::error::{StockError, StockResult};
use crate::io;
use crate::territory::{BaTractArea, Sector};

/// Weights sum to one per BA within this tolerance.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// County of an 11-digit FIPS tract code.
pub fn county_of_census_code(code: &str) -> StockResult<&str> {
    code.get(..code.len().min(5))
        .ok_or_else(|| StockError::Data(format!("census code {code:?} has no 5-byte county prefix")))
}

/// w(ba, county): non-negative, finite, and summing to one for every BA.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationWeights {
    by_ba: BTreeMap<String, BTreeMap<String, f64>>,
}

impl AllocationWeights {
    /// Accumulate raw (ba, county, amount) contributions and normalize within each BA.
    /// BAs whose total is zero are dropped; negative or non-finite amounts are an error.
    pub fn from_amounts(amounts: impl IntoIterator<Item = (String, String, f64)>) -> StockResult<Self> {
        let mut by_ba = BTreeMap::<String, BTreeMap<String, f64>>::new();
        for (ba, county, amount) in amounts {
            if !amount.is_finite() || amount < 0.0 {
                return Err(StockError::Data(format!("weight for ({ba}, {county}) is {amount}")));
            }
            *by_ba.entry(ba).or_default().entry(county).or_default() += amount;
        }
        by_ba.retain(|_, counties| counties.values().sum::<f64>() > 0.0);
        for counties in by_ba.values_mut() {
            let total = counties.values().sum::<f64>();
            counties.values_mut().for_each(|w| *w /= total);
        }
        Ok(Self { by_ba })
    }

    /// Area weighting: the BA's commercial floor area by county.
    pub fn from_floor_area(table: &BaTractArea) -> StockResult<Self> {
        let rows = table.iter()
            .map(|(ba, tract, areas)| Ok((
                ba.to_string(),
                county_of_census_code(tract)?.to_string(),
                areas[Sector::Commercial as usize],
            )))
            .collect::<StockResult<Vec<_>>>()?;
        Self::from_amounts(rows)
    }

    pub fn weight(&self, ba: &str, county: &str) -> f64 {
        self.by_ba.get(ba).and_then(|c| c.get(county)).copied().unwrap_or(0.0)
    }

    /// Counties and weights of one BA.
    pub fn counties(&self, ba: &str) -> Option<&BTreeMap<String, f64>> {
        self.by_ba.get(ba)
    }

    #[inline] pub fn len(&self) -> usize { self.by_ba.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.by_ba.is_empty() }

    /// Re-check the weight invariants, e.g. after reading from disk.
    pub fn validate(&self) -> StockResult<()> {
        for (ba, counties) in &self.by_ba {
            if counties.values().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(StockError::Data(format!("BA {ba} has a negative or non-finite weight")));
            }
            let total = counties.values().sum::<f64>();
            if (total - 1.0).abs() > WEIGHT_TOLERANCE {
                return Err(StockError::Data(format!("weights of BA {ba} sum to {total}")));
            }
        }
        Ok(())
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let rows = self.by_ba.iter()
            .flat_map(|(ba, counties)| counties.iter().map(move |(c, w)| (ba.clone(), c.clone(), *w)))
            .collect::<Vec<_>>();
        Ok(DataFrame::new(vec![
            Column::new("ba".into(), rows.iter().map(|r| r.0.clone()).collect::<Vec<_>>()),
            Column::new("county".into(), rows.iter().map(|r| r.1.clone()).collect::<Vec<_>>()),
            Column::new("weight".into(), rows.iter().map(|r| r.2).collect::<Vec<_>>()),
        ])?)
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        io::csv::write_csv(&mut self.to_dataframe()?, path)
    }

    /// Read `{ba, county, weight}` rows; weights are renormalized per BA.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let df = io::csv::read_csv_strings(path)?;
        let bas = io::csv::string_column(&df, "ba")?;
        let counties = io::csv::string_column(&df, "county")?;
        let weights = io::csv::float_column(&df, "weight")?;
        let amounts = bas.into_iter().zip(counties).zip(weights)
            .map(|((ba, county), w)| (ba, county, w.unwrap_or(f64::NAN)))
            .collect::<Vec<_>>();
        Ok(Self::from_amounts(amounts)
            .with_context(|| format!("[profile::weights] invalid weights in {}", path.display()))?)
    }
}
