use std::path::Path;

use ahash::AHashMap;
use anyhow::{ensure, Context, Result};
use polars::{frame::DataFrame, prelude::Column};

use crate::io;

/// Literal written for a missing value.
pub const NA: &str = "NA";

/// Name of the 1-based row identifier column.
pub const BUILDING: &str = "Building";

/// An ordered, fixed-cardinality table of sampled buildings.
/// Row `i` is building `i + 1`; columns are attribute names in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stock {
    len: usize,
    names: Vec<String>,
    columns: Vec<Vec<String>>,
    index: AHashMap<String, usize>,
}

impl Stock {
    /// An empty stock of `len` rows with no attributes yet.
    pub fn new(len: usize) -> Self {
        Self { len, ..Default::default() }
    }

    #[inline] pub fn len(&self) -> usize { self.len }

    #[inline] pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Attribute names, in column order.
    #[inline] pub fn attributes(&self) -> &[String] { &self.names }

    #[inline] pub fn has(&self, name: &str) -> bool { self.index.contains_key(name) }

    /// Get a column by attribute name.
    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.index.get(name).map(|&i| self.columns[i].as_slice())
    }

    /// Get a single cell.
    pub fn value(&self, row: usize, name: &str) -> Option<&str> {
        self.column(name).and_then(|c| c.get(row)).map(String::as_str)
    }

    /// Append or replace a column. Panics if the length does not match the stock.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) {
        assert_eq!(values.len(), self.len, "column `{name}` has {} rows, stock has {}", values.len(), self.len);
        match self.index.get(name) {
            Some(&i) => self.columns[i] = values,
            None => {
                self.index.insert(name.to_string(), self.columns.len());
                self.names.push(name.to_string());
                self.columns.push(values);
            }
        }
    }

    /// Repeat every row `k` times in place (row i becomes rows i*k .. i*k+k).
    pub fn replicate(&self, k: usize) -> Self {
        let columns = self.columns.iter()
            .map(|c| c.iter().flat_map(|v| std::iter::repeat_n(v.clone(), k)).collect())
            .collect();
        Self { len: self.len * k, names: self.names.clone(), columns, index: self.index.clone() }
    }

    /// Convert to a DataFrame with a leading 1-based `Building` column.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.names.len() + 1);
        columns.push(Column::new(BUILDING.into(), (1..=self.len as i64).collect::<Vec<_>>()));
        for (name, values) in self.names.iter().zip(&self.columns) {
            columns.push(Column::new(name.as_str().into(), values));
        }
        Ok(DataFrame::new(columns)?)
    }

    /// Build from an all-string DataFrame; a `Building` column, if present, must be 1..=N.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let mut stock = Self::new(df.height());
        for name in df.get_column_names() {
            let values = io::csv::string_column(df, name.as_str())?;
            if name.as_str() == BUILDING {
                let in_order = values.iter().enumerate()
                    .all(|(i, v)| v.parse::<usize>().ok() == Some(i + 1));
                ensure!(in_order, "[sampling::stock] `{BUILDING}` column is not 1..={}", df.height());
                continue;
            }
            let values = values.into_iter()
                .map(|v| if v.is_empty() { NA.to_string() } else { v })
                .collect();
            stock.set_column(name.as_str(), values);
        }
        Ok(stock)
    }

    /// Write `buildstock.csv`-style output, published atomically.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        io::csv::write_csv(&mut self.to_dataframe()?, path)
            .with_context(|| format!("[sampling::stock] Failed to write stock to {}", path.display()))
    }

    /// Read a stock written by [`Stock::write_csv`].
    pub fn read_csv(path: &Path) -> Result<Self> {
        Self::from_dataframe(&io::csv::read_csv_strings(path)?)
    }
}
