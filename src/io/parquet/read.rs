//! Parquet reading operations.

use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerReader, prelude::{DataType, ParquetReader}};

/// Read a Parquet file into a DataFrame.
pub(crate) fn read_parquet(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::parquet::read] Failed to open Parquet file: {}", path.display()))?;
    ParquetReader::new(file)
        .finish()
        .with_context(|| format!("[io::parquet::read] Failed to read Parquet from {:?}", path))
}

/// Collect a numeric column as f64; nulls become NaN.
pub(crate) fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df.column(name)
        .with_context(|| format!("[io::parquet::read] missing column {name:?}"))?
        .cast(&DataType::Float64)
        .with_context(|| format!("[io::parquet::read] column {name:?} is not numeric"))?;
    Ok(column.f64()?.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}
