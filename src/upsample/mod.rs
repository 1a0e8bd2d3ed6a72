//! Bootstrap replication and correlated fuel/HVAC attribute draws.

use std::collections::BTreeSet;

use rand::Rng;
use tracing::info;

use crate::distribution::ConditionalTable;
use crate::error::{StockError, StockResult};
use crate::geography::census_division;
use crate::sampling::{invert, Stock};
use crate::tracts::COUNTY;

pub const CENSUS_DIVISION: &str = "census_division";
pub const HEATING_FUEL: &str = "heating_fuel";
pub const SYSTEM_TYPE: &str = "system_type";
pub const HVAC_AND_FUELTYPE: &str = "hvac_and_fueltype";

/// Default bootstrap coefficient.
pub const DEFAULT_FACTOR: usize = 3;

/// Repeat every row `k` times. Pure duplication: no attribute is perturbed.
pub fn bootstrap(stock: &Stock, k: usize) -> StockResult<Stock> {
    if k == 0 {
        return Err(StockError::Sampling("bootstrap factor must be at least 1".into()));
    }
    Ok(stock.replicate(k))
}

/// Add `census_division` from the state prefix of each row's county.
/// Counties whose state is unknown are reported together as a `CoverageGap`.
pub fn merge_census_division(stock: &mut Stock) -> StockResult<()> {
    let counties = stock.column(COUNTY)
        .ok_or_else(|| StockError::Data(format!("stock has no `{COUNTY}` column")))?;

    let mut missing = BTreeSet::new();
    let divisions = counties.iter()
        .map(|county| match census_division(county) {
            Some(division) => division.to_string(),
            None => {
                missing.insert(county.clone());
                String::new()
            }
        })
        .collect();
    if !missing.is_empty() {
        return Err(StockError::CoverageGap {
            partition: CENSUS_DIVISION.into(),
            entities: missing.into_iter().collect(),
        });
    }
    stock.set_column(CENSUS_DIVISION, divisions);
    Ok(())
}

/// Draw one option per row from `table`, conditioned on the row's own dependency values.
/// One uniform is drawn per row, in row order; options are walked in table column order.
pub fn sample_attribute(stock: &Stock, table: &ConditionalTable, rng: &mut impl Rng) -> StockResult<Vec<String>> {
    (0..stock.len())
        .map(|i| {
            let probs = table.lookup_with(|dep| stock.value(i, dep))?;
            let u = rng.random::<f64>();
            let choice = invert(probs, u)
                .ok_or_else(|| StockError::malformed(table.name(), "row has no positive option"))?;
            Ok(table.options()[choice].clone())
        })
        .collect()
}

/// Bootstraps a stock and draws heating fuel, then HVAC system type conditioned on it.
#[derive(Debug)]
pub struct Upsampler<'t> {
    fuel: &'t ConditionalTable,
    hvac: &'t ConditionalTable,
    factor: usize,
}

impl<'t> Upsampler<'t> {
    /// `fuel` is P(fuel | building_type, county); `hvac` is
    /// P(system_type | building_type, heating_fuel, census_division).
    pub fn new(fuel: &'t ConditionalTable, hvac: &'t ConditionalTable, factor: usize) -> Self {
        Self { fuel, hvac, factor }
    }

    pub fn run(&self, stock: &Stock, rng: &mut impl Rng) -> StockResult<Stock> {
        let mut out = bootstrap(stock, self.factor)?;
        merge_census_division(&mut out)?;

        let fuels = sample_attribute(&out, self.fuel, rng)?;
        out.set_column(HEATING_FUEL, fuels);

        let systems = sample_attribute(&out, self.hvac, rng)?;
        let combined = systems.iter().zip(out.column(HEATING_FUEL).unwrap_or_default())
            .map(|(system, fuel)| format!("{system}_{fuel}"))
            .collect();
        out.set_column(SYSTEM_TYPE, systems);
        out.set_column(HVAC_AND_FUELTYPE, combined);

        info!(rows_in = stock.len(), rows_out = out.len(), factor = self.factor, "upsampled stock");
        Ok(out)
    }
}
