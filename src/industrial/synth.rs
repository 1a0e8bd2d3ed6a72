use std::{collections::BTreeMap, path::Path};

use anyhow::{bail, ensure, Context, Result};
use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::config::IndustrialConfig;
use crate::error::{StockError, StockResult};
use crate::industrial::{features::feature_matrix, gbm::GbmRegressor};
use crate::io;
use crate::profile::{hourly_index, parse_utc, ProfileSet, TIMESTAMP};

/// Column of per-BA annual industrial sales (MWh).
pub const INDUSTRIAL_SALES: &str = "industrial_mwh";

/// Hourly industrial load of one or more reference utilities on a shared local-time index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceLoads {
    pub times: Vec<NaiveDateTime>,
    pub series: BTreeMap<String, Vec<f64>>,
}

impl ReferenceLoads {
    /// Read a CSV with a `timestamp` column and one load column per utility.
    /// Rows missing any utility's value are dropped.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let df = io::csv::read_csv_strings(path)?;
        let stamps = io::csv::string_column(&df, TIMESTAMP)?;
        let names = df.get_column_names().into_iter()
            .map(|n| n.to_string())
            .filter(|n| n != TIMESTAMP)
            .collect::<Vec<_>>();
        ensure!(!names.is_empty(), "[industrial::synth] {} has no load columns", path.display());
        let columns = names.iter().map(|n| io::csv::float_column(&df, n)).collect::<Result<Vec<_>>>()?;

        let mut loads = Self::default();
        let mut dropped = 0usize;
        for (i, stamp) in stamps.iter().enumerate() {
            let Some(time) = parse_utc(stamp) else {
                bail!("[industrial::synth] unparseable timestamp {stamp:?} on row {} of {}", i + 1, path.display());
            };
            let Some(row) = columns.iter().map(|c| c[i]).collect::<Option<Vec<f64>>>() else {
                dropped += 1;
                continue
            };
            loads.times.push(time);
            for (name, v) in names.iter().zip(row) {
                loads.series.entry(name.clone()).or_default().push(v);
            }
        }
        if dropped > 0 {
            debug!(dropped, path = %path.display(), "dropped incomplete reference rows");
        }
        Ok(loads)
    }

    /// Unitize each utility's series and average them into one training target.
    pub fn target(&self) -> StockResult<Vec<f64>> {
        if self.series.is_empty() || self.times.is_empty() {
            return Err(StockError::Data("reference loads are empty".into()));
        }
        let mut target = vec![0.0; self.times.len()];
        for (name, values) in &self.series {
            let unit = unitize(values).map_err(|e| StockError::Data(format!("reference `{name}`: {e}")))?;
            for (t, u) in target.iter_mut().zip(unit) {
                *t += u;
            }
        }
        let count = self.series.len() as f64;
        target.iter_mut().for_each(|t| *t /= count);
        Ok(target)
    }
}

/// Scale a series to sum to one.
pub fn unitize(values: &[f64]) -> StockResult<Vec<f64>> {
    let total = values.iter().sum::<f64>();
    if !total.is_finite() || total <= 0.0 {
        return Err(StockError::Data(format!("cannot unitize a series summing to {total}")));
    }
    Ok(values.iter().map(|v| v / total).collect())
}

/// Read `{ba, industrial_mwh}` rows.
pub fn read_sales(path: &Path) -> Result<BTreeMap<String, f64>> {
    let df = io::csv::read_csv_strings(path)?;
    let bas = io::csv::string_column(&df, "ba")?;
    let sales = io::csv::float_column(&df, INDUSTRIAL_SALES)?;
    let mut out = BTreeMap::new();
    for (ba, mwh) in bas.into_iter().zip(sales) {
        let mwh = mwh.with_context(|| format!("[industrial::synth] missing {INDUSTRIAL_SALES} for {ba} in {}", path.display()))?;
        *out.entry(ba).or_insert(0.0) += mwh;
    }
    Ok(out)
}

/// Calendar-driven industrial load shape fitted to reference utilities.
#[derive(Debug, Clone)]
pub struct IndustrialSynthesizer {
    model: GbmRegressor,
}

impl IndustrialSynthesizer {
    pub fn fit(reference: &ReferenceLoads, params: &IndustrialConfig) -> StockResult<Self> {
        let target = reference.target()?;
        let x = feature_matrix(&reference.times);
        let model = GbmRegressor::fit(&x, &target, params)?;
        info!(rows = target.len(), utilities = reference.series.len(), trees = model.n_trees(), "fitted industrial shape");
        Ok(Self { model })
    }

    /// Predicted 8760-hour shape for `year`, clipped at zero and normalized to sum to one.
    pub fn shape(&self, year: i32) -> StockResult<Vec<f64>> {
        let x = feature_matrix(&hourly_index(year)?);
        let mut shape = self.model.predict(&x)?;
        shape.iter_mut().for_each(|v| *v = v.max(0.0));
        unitize(&shape)
    }

    /// Per-BA hourly industrial load: the shape scaled by each BA's annual sales.
    pub fn profiles(&self, year: i32, sales: &BTreeMap<String, f64>) -> StockResult<ProfileSet> {
        let shape = self.shape(year)?;
        let mut set = ProfileSet::new();
        for (ba, &mwh) in sales {
            if !mwh.is_finite() || mwh < 0.0 {
                return Err(StockError::Data(format!("annual industrial sales of {ba} is {mwh}")));
            }
            set.insert(ba, shape.iter().map(|s| s * mwh).collect())?;
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::HOURS;
    use chrono::Timelike;

    fn params() -> IndustrialConfig {
        IndustrialConfig { seed: 0, n_estimators: 50, learning_rate: 0.2, max_depth: 3, subsample: 0.8 }
    }

    fn reference() -> ReferenceLoads {
        let times = hourly_index(2019).unwrap();
        let load = |t: &NaiveDateTime, base: f64| if (8..18).contains(&t.hour()) { 2.0 * base } else { base };
        let mut series = BTreeMap::new();
        series.insert("A".to_string(), times.iter().map(|t| load(t, 10.0)).collect());
        series.insert("B".to_string(), times.iter().map(|t| load(t, 30.0)).collect());
        ReferenceLoads { times, series }
    }

    #[test]
    fn unitize_sums_to_one() {
        let u = unitize(&[1.0, 3.0]).unwrap();
        assert_eq!(u, vec![0.25, 0.75]);
        assert!(unitize(&[0.0, 0.0]).is_err());
    }

    #[test]
    fn target_averages_unitized_series() {
        let target = reference().target().unwrap();
        assert!((target.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn profiles_scale_shape_by_annual_sales() {
        let synth = IndustrialSynthesizer::fit(&reference(), &params()).unwrap();
        let sales = BTreeMap::from([("PSCO".to_string(), 8760.0), ("CISO".to_string(), 100.0)]);
        let profiles = synth.profiles(2020, &sales).unwrap();
        let psco = profiles.get("PSCO").unwrap();
        assert_eq!(psco.len(), HOURS);
        assert!((psco.iter().sum::<f64>() - 8760.0).abs() < 1e-6);
        assert!(psco.iter().all(|v| *v >= 0.0));
        // daytime hours carry more load than night
        assert!(psco[12] > psco[2]);
        assert!((profiles.get("CISO").unwrap().iter().sum::<f64>() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn fit_is_deterministic() {
        let a = IndustrialSynthesizer::fit(&reference(), &params()).unwrap().shape(2021).unwrap();
        let b = IndustrialSynthesizer::fit(&reference(), &params()).unwrap().shape(2021).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn reads_reference_and_sales_csv() {
        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("reference.csv");
        std::fs::write(&reference, "timestamp,A,B\n2019-01-01 00:00:00,1,2\n2019-01-01 01:00:00,,3\n2019-01-01 02:00:00,4,5\n").unwrap();
        let loads = ReferenceLoads::read_csv(&reference).unwrap();
        assert_eq!(loads.times.len(), 2);
        assert_eq!(loads.series["B"], vec![2.0, 5.0]);

        let sales = dir.path().join("sales.csv");
        std::fs::write(&sales, "ba,industrial_mwh\nPSCO,\"1,000\"\nCISO,5\n").unwrap();
        let sales = read_sales(&sales).unwrap();
        assert_eq!(sales["PSCO"], 1000.0);
        assert_eq!(sales["CISO"], 5.0);
    }
}
