//! CSV / TSV reading operations.

use std::{fs::File, io::Cursor, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerReader, prelude::{CsvReadOptions, CsvReader, DataType}};

/// Reads a comma-separated file with every column kept as a string.
/// Geographic codes keep their leading zeros this way.
pub(crate) fn read_csv_strings(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv::read] Failed to open CSV file: {}", path.display()))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[io::csv::read] Failed to read CSV from {:?}", path))
}

/// Reads a spreadsheet export whose real header sits below `skip` banner rows.
pub(crate) fn read_csv_skipping(path: &Path, skip: usize) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv::read] Failed to open CSV file: {}", path.display()))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_skip_rows(skip)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[io::csv::read] Failed to read CSV from {:?} (skipping {skip} rows)", path))
}

/// Reads tab-delimited bytes with every column kept as a string.
pub(crate) fn read_tsv_bytes(bytes: &[u8]) -> Result<DataFrame> {
    CsvReader::new(Cursor::new(bytes))
        .with_options(CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .map_parse_options(|po| po.with_separator(b'\t')))
        .finish()
        .context("[io::csv::read] Failed to read TSV from bytes")
}

/// Collect a string column as owned values; nulls become empty strings.
pub(crate) fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = df.column(name)
        .with_context(|| format!("[io::csv::read] missing column {name:?}"))?
        .cast(&DataType::String)
        .with_context(|| format!("[io::csv::read] column {name:?} is not castable to String"))?;
    Ok(column.str()?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()).unwrap_or_default())
        .collect())
}

/// Collect a column as optional floats, parsing strings when needed.
pub(crate) fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    Ok(string_column(df, name)?.iter()
        .map(|s| s.replace(',', "").parse::<f64>().ok())
        .collect())
}
