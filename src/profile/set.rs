//! Named 8760-hour profiles and their file formats.

use std::{collections::BTreeMap, path::Path};

use ahash::AHashMap;
use anyhow::{bail, ensure, Context, Result};
use chrono::{NaiveDateTime, DateTime};
use polars::{frame::DataFrame, prelude::{Column, DataType, TimeUnit}};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{StockError, StockResult};
use crate::{common, io};
use crate::profile::calendar::{hour_of_year, index_millis, to_local, HOURS};

/// Name of the datetime index column in profile files.
pub const TIMESTAMP: &str = "timestamp";

/// Columns of an hourly demand file.
pub const DEMAND_TIME: &str = "timestamp";
pub const DEMAND_MW: &str = "mw";

/// Profiles keyed by column name (a BA code or a county id), each exactly 8760 long.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileSet {
    columns: BTreeMap<String, Vec<f64>>,
}

impl ProfileSet {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, name: &str, values: Vec<f64>) -> StockResult<()> {
        if values.len() != HOURS {
            return Err(StockError::Data(format!("profile `{name}` has {} hours, expected {HOURS}", values.len())));
        }
        self.columns.insert(name.to_string(), values);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Column names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Keep only the named columns.
    pub fn retain(&mut self, keep: &[String]) {
        self.columns.retain(|name, _| keep.contains(name));
    }

    #[inline] pub fn len(&self) -> usize { self.columns.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.columns.is_empty() }

    /// Elementwise sum across all columns, one value per hour.
    pub fn hourly_total(&self) -> Vec<f64> {
        let mut total = vec![0.0; HOURS];
        for values in self.columns.values() {
            for (t, v) in total.iter_mut().zip(values) {
                *t += v;
            }
        }
        total
    }

    /// A frame with a leading datetime index for `year` followed by one column per profile.
    pub fn to_dataframe(&self, year: i32) -> Result<DataFrame> {
        let index = Column::new(TIMESTAMP.into(), index_millis(year)?)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        let mut columns = vec![index];
        for (name, values) in &self.columns {
            columns.push(Column::new(name.as_str().into(), values.as_slice()));
        }
        Ok(DataFrame::new(columns)?)
    }

    pub fn write_parquet(&self, path: &Path, year: i32) -> Result<()> {
        io::parquet::write_parquet(&mut self.to_dataframe(year)?, path)
            .with_context(|| format!("[profile::set] Failed to write profiles to {}", path.display()))
    }

    /// Every non-index column of an 8760-row frame becomes a profile.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        ensure!(df.height() == HOURS, "[profile::set] expected {HOURS} rows, found {}", df.height());
        let mut set = Self::new();
        for name in df.get_column_names() {
            if name.as_str() == TIMESTAMP { continue }
            set.insert(name.as_str(), io::parquet::f64_column(df, name.as_str())?)?;
        }
        Ok(set)
    }

    pub fn read_parquet(path: &Path) -> Result<Self> {
        Self::from_dataframe(&io::parquet::read_parquet(path)?)
            .with_context(|| format!("[profile::set] Failed to read profiles from {}", path.display()))
    }
}

/// Parse a UTC timestamp as written by hourly demand exports.
pub fn parse_utc(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t.naive_utc());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%m/%d/%Y %H:%M"].iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Align (UTC time, MW) readings to the 8760 local-hour index of `year`.
/// Readings outside the year or on Feb 29 are skipped; hours with no reading stay zero.
/// Returns the profile and the number of empty hours.
pub fn align_readings(readings: &[(NaiveDateTime, f64)], offset_hours: i32, year: i32) -> (Vec<f64>, usize) {
    let mut values = vec![0.0; HOURS];
    let mut seen = vec![false; HOURS];
    for &(utc, mw) in readings {
        let local = to_local(utc, offset_hours);
        if chrono::Datelike::year(&local) != year { continue }
        if let Some(h) = hour_of_year(local) {
            values[h] = mw;
            seen[h] = true;
        }
    }
    let missing = seen.iter().filter(|s| !**s).count();
    (values, missing)
}

/// Read one BA's hourly demand CSV (`timestamp`, `mw`).
pub fn read_demand_csv(path: &Path, offset_hours: i32, year: i32) -> Result<Vec<f64>> {
    let df = io::csv::read_csv_strings(path)?;
    let times = io::csv::string_column(&df, DEMAND_TIME)?;
    let mw = io::csv::float_column(&df, DEMAND_MW)?;

    let mut readings = Vec::with_capacity(times.len());
    for (i, (time, value)) in times.iter().zip(mw).enumerate() {
        let Some(utc) = parse_utc(time) else {
            bail!("[profile::set] unparseable timestamp {time:?} on row {} of {}", i + 1, path.display());
        };
        if let Some(value) = value {
            readings.push((utc, value));
        }
    }

    let (values, missing) = align_readings(&readings, offset_hours, year);
    if missing > 0 {
        warn!(path = %path.display(), missing, "hours without a demand reading were left at zero");
    }
    Ok(values)
}

/// Read every `<BA>.csv` under `dir`. Each BA needs a UTC offset; BAs without one are
/// reported together as a `CoverageGap`.
pub fn read_demand_dir(dir: &Path, offsets: &AHashMap<String, i32>, year: i32) -> Result<ProfileSet> {
    common::require_dir_exists(dir)?;
    let paths = WalkDir::new(dir).max_depth(1).sort_by_file_name().into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|e| e == "csv"))
        .collect::<Vec<_>>();

    let ba_of = |p: &Path| p.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string();
    let missing = paths.iter().map(|p| ba_of(p)).filter(|ba| !offsets.contains_key(ba)).collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(StockError::CoverageGap { partition: "utc_offset".into(), entities: missing }.into());
    }

    let mut set = ProfileSet::new();
    for path in &paths {
        let ba = ba_of(path);
        debug!(ba = %ba, "reading demand");
        let offset = offsets.get(&ba).copied().unwrap_or_default();
        set.insert(&ba, read_demand_csv(path, offset, year)?)?;
    }
    Ok(set)
}

/// Read `{ba, utc_offset}` rows.
pub fn read_offsets(path: &Path) -> Result<AHashMap<String, i32>> {
    let df = io::csv::read_csv_strings(path)?;
    let bas = io::csv::string_column(&df, "ba")?;
    let offsets = io::csv::string_column(&df, "utc_offset")?;
    bas.into_iter().zip(offsets)
        .map(|(ba, offset)| Ok((ba, offset.parse::<i32>()
            .with_context(|| format!("[profile::set] bad utc_offset {offset:?} in {}", path.display()))?)))
        .collect()
}
