//! Customer totals and BA codes from EIA Form 861 sheet exports.

use std::path::Path;

use ahash::AHashMap;
use anyhow::Result;
use tracing::info;

use crate::io;

/// Banner rows above the real header in a sheet export.
pub const BANNER_ROWS: usize = 2;

/// Synthetic "state adjustment" utility id.
pub const ADJUSTMENT_ID: u32 = 99999;

pub const UTILITY_NUMBER: &str = "Utility Number";
pub const STATE: &str = "State";
pub const PART: &str = "Part";
pub const OWNERSHIP: &str = "Ownership";
pub const BA_CODE: &str = "BA Code";
pub const TOTAL_CUSTOMERS: &str = "Total Customers";

/// One accepted sheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRow {
    pub utility_id: u32,
    pub state: String,
    pub ba_code: Option<String>,
    pub customers: f64,
}

/// Rows dropped by [`filter_rows`], by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustomerFilterCounts {
    pub part_c: usize,
    pub behind_the_meter: usize,
    pub adjustment: usize,
    pub bad_id: usize,
    pub null_total: usize,
}

/// Apply the sheet filters: drop "Part C" rows, "Behind the Meter" ownership,
/// the adjustment id, non-integer ids and rows without a customer total.
pub fn filter_rows(
    ids: &[String],
    states: &[String],
    parts: Option<&[String]>,
    ownership: &[String],
    ba_codes: &[String],
    totals: &[Option<f64>],
) -> (Vec<CustomerRow>, CustomerFilterCounts) {
    let mut counts = CustomerFilterCounts::default();
    let mut rows = Vec::with_capacity(ids.len());
    for i in 0..ids.len() {
        if parts.is_some_and(|p| p[i].eq_ignore_ascii_case("C")) {
            counts.part_c += 1;
            continue;
        }
        if ownership[i].eq_ignore_ascii_case("Behind the Meter") {
            counts.behind_the_meter += 1;
            continue;
        }
        let Ok(utility_id) = ids[i].parse::<u32>() else {
            counts.bad_id += 1;
            continue;
        };
        if utility_id == ADJUSTMENT_ID {
            counts.adjustment += 1;
            continue;
        }
        let Some(customers) = totals[i] else {
            counts.null_total += 1;
            continue;
        };
        let ba_code = Some(ba_codes[i].trim()).filter(|s| !s.is_empty()).map(str::to_string);
        rows.push(CustomerRow { utility_id, state: states[i].trim().to_string(), ba_code, customers });
    }
    (rows, counts)
}

/// Read one sheet export. `has_part` is false for the short form, which has no `Part` column.
pub fn read_sheet(path: &Path, has_part: bool) -> Result<Vec<CustomerRow>> {
    let df = io::csv::read_csv_skipping(path, BANNER_ROWS)?;
    let ids = io::csv::string_column(&df, UTILITY_NUMBER)?;
    let states = io::csv::string_column(&df, STATE)?;
    let parts = if has_part { Some(io::csv::string_column(&df, PART)?) } else { None };
    let ownership = io::csv::string_column(&df, OWNERSHIP)?;
    let ba_codes = io::csv::string_column(&df, BA_CODE)?;
    let totals = io::csv::float_column(&df, TOTAL_CUSTOMERS)?;

    let (rows, counts) = filter_rows(&ids, &states, parts.as_deref(), &ownership, &ba_codes, &totals);
    info!(path = %path.display(), kept = rows.len(), dropped = ?counts, "read customer sheet");
    Ok(rows)
}

/// Customer totals and BA code per (utility id, state), merged over both sheets.
#[derive(Debug, Clone, Default)]
pub struct CustomerTable {
    entries: AHashMap<(u32, String), (f64, Option<String>)>,
}

impl CustomerTable {
    pub fn from_rows(rows: impl IntoIterator<Item = CustomerRow>) -> Self {
        let mut entries = AHashMap::<(u32, String), (f64, Option<String>)>::new();
        for row in rows {
            let entry = entries.entry((row.utility_id, row.state)).or_insert((0.0, None));
            entry.0 += row.customers;
            if entry.1.is_none() {
                entry.1 = row.ba_code;
            }
        }
        Self { entries }
    }

    /// Read and merge the annual sales sheet and the short form.
    pub fn read(sales: &Path, short_form: &Path) -> Result<Self> {
        let mut rows = read_sheet(sales, true)?;
        rows.extend(read_sheet(short_form, false)?);
        Ok(Self::from_rows(rows))
    }

    pub fn customers(&self, utility_id: u32, state: &str) -> Option<f64> {
        self.entries.get(&(utility_id, state.to_string())).map(|e| e.0)
    }

    pub fn ba_code(&self, utility_id: u32, state: &str) -> Option<&str> {
        self.entries.get(&(utility_id, state.to_string())).and_then(|e| e.1.as_deref())
    }

    #[inline] pub fn len(&self) -> usize { self.entries.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALES: &str = "Utility Level Data,,,,,,\n\
                         Sales to Ultimate Customers,,,,,,\n\
                         Utility Number,Utility Name,Part,State,Ownership,BA Code,Total Customers\n\
                         100,Alpha,A,CO,Investor Owned,PSCO,\"1,200\"\n\
                         100,Alpha,C,CO,Investor Owned,PSCO,50\n\
                         200,Beta,A,CO,Behind the Meter,PSCO,10\n\
                         99999,Adjustment,A,CO,State,,5\n\
                         300,Gamma,A,CO,Cooperative,WACM,\n\
                         4x0,Delta,A,CO,Cooperative,WACM,7\n";

    const SHORT: &str = "Short Form,,,,\n\
                         ,,,,\n\
                         Utility Number,State,Ownership,BA Code,Total Customers\n\
                         100,CO,Investor Owned,,300\n\
                         500,WY,Municipal,WACM,40\n";

    #[test]
    fn sheet_filters_drop_the_documented_rows() {
        let dir = tempfile::tempdir().unwrap();
        let sales = dir.path().join("sales.csv");
        let short = dir.path().join("short.csv");
        std::fs::write(&sales, SALES).unwrap();
        std::fs::write(&short, SHORT).unwrap();

        let rows = read_sheet(&sales, true).unwrap();
        assert_eq!(rows, vec![CustomerRow { utility_id: 100, state: "CO".into(), ba_code: Some("PSCO".into()), customers: 1200.0 }]);

        let table = CustomerTable::read(&sales, &short).unwrap();
        assert_eq!(table.customers(100, "CO"), Some(1500.0));
        assert_eq!(table.ba_code(100, "CO"), Some("PSCO"));
        assert_eq!(table.ba_code(500, "WY"), Some("WACM"));
        assert_eq!(table.customers(300, "CO"), None);
    }
}
