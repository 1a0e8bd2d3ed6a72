//! Parquet writing operations.

use std::path::Path;

use anyhow::{Context, Result};
use polars::{frame::DataFrame, prelude::ParquetWriter};

use crate::common::publish_atomic;

/// Write a DataFrame to a Parquet file, publishing it atomically.
pub(crate) fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<()> {
    publish_atomic(path, |tmp| {
        ParquetWriter::new(tmp.as_file_mut())
            .finish(df)
            .with_context(|| format!("[io::parquet::write] Failed to write Parquet to {:?}", path))?;
        Ok(())
    })
}
