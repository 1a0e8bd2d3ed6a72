//! CSV writing operations.

use std::path::Path;

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerWriter, prelude::CsvWriter};

use crate::common::publish_atomic;

/// Write a DataFrame to a CSV file, publishing it atomically.
pub(crate) fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    publish_atomic(path, |tmp| {
        CsvWriter::new(tmp.as_file_mut())
            .finish(df)
            .with_context(|| format!("[io::csv::write] Failed to write CSV to {:?}", path))
    })
}
