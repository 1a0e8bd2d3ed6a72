use ahash::AHashMap;
use polars::frame::DataFrame;
use smallvec::SmallVec;

use crate::error::{StockError, StockResult};

/// Header prefix marking a dependency column.
pub const DEPENDENCY_PREFIX: &str = "Dependency=";

/// Header prefix marking an option (probability) column.
pub const OPTION_PREFIX: &str = "Option=";

/// Allowed deviation of a row sum from one.
pub const SUM_TOLERANCE: f64 = 1e-6;

/// Dependency values of one row, in dependency-column order.
pub type DepKey = SmallVec<[String; 4]>;

/// Trim surrounding whitespace and stray quoting from a cell.
#[inline]
pub(crate) fn normalize(value: &str) -> &str {
    value.trim().trim_matches('"').trim()
}

/// A conditional distribution P(option | dependencies) over a categorical attribute.
/// Immutable once built; every realized dependency tuple owns exactly one row.
#[derive(Debug, Clone)]
pub struct ConditionalTable {
    name: String,
    dependencies: Vec<String>,
    options: Vec<String>,
    keys: Vec<DepKey>,
    probs: Vec<Vec<f64>>,
    index: AHashMap<DepKey, usize>,
}

impl ConditionalTable {
    /// Build a table from parsed rows, validating every invariant.
    pub fn new(
        name: &str,
        dependencies: Vec<String>,
        options: Vec<String>,
        rows: Vec<(DepKey, Vec<f64>)>,
    ) -> StockResult<Self> {
        if options.is_empty() {
            return Err(StockError::malformed(name, "no option columns"));
        }

        let mut keys = Vec::with_capacity(rows.len());
        let mut probs = Vec::with_capacity(rows.len());
        let mut index = AHashMap::with_capacity(rows.len());

        for (i, (key, row)) in rows.into_iter().enumerate() {
            if key.len() != dependencies.len() {
                return Err(StockError::malformed(name, format!(
                    "row {i} has {} dependency values, expected {}", key.len(), dependencies.len()
                )));
            }
            if row.len() != options.len() {
                return Err(StockError::malformed(name, format!(
                    "row {i} has {} option values, expected {}", row.len(), options.len()
                )));
            }
            if let Some(bad) = row.iter().find(|p| !p.is_finite() || **p < 0.0) {
                return Err(StockError::malformed(name, format!("row {i} has invalid probability {bad}")));
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > SUM_TOLERANCE {
                return Err(StockError::malformed(name, format!(
                    "row [{}] sums to {sum}", key.join(", ")
                )));
            }
            if index.insert(key.clone(), keys.len()).is_some() {
                return Err(StockError::malformed(name, format!(
                    "duplicate dependency tuple [{}]", key.join(", ")
                )));
            }
            keys.push(key);
            probs.push(row);
        }

        if keys.is_empty() {
            return Err(StockError::malformed(name, "table has no rows"));
        }

        Ok(Self { name: name.to_string(), dependencies, options, keys, probs, index })
    }

    /// Parse a table from an all-string DataFrame whose headers carry the
    /// `Dependency=` / `Option=` prefixes. Columns with neither prefix are ignored.
    pub fn from_dataframe(name: &str, df: &DataFrame) -> StockResult<Self> {
        let mut dep_cols = Vec::new();
        let mut opt_cols = Vec::new();
        for column in df.get_columns() {
            let header = normalize(column.name().as_str());
            if let Some(dep) = header.strip_prefix(DEPENDENCY_PREFIX) {
                dep_cols.push((dep.to_string(), column));
            } else if let Some(opt) = header.strip_prefix(OPTION_PREFIX) {
                opt_cols.push((opt.to_string(), column));
            }
        }

        let dep_values = dep_cols.iter()
            .map(|(_, column)| column.str().map(|s| s.into_iter().collect::<Vec<_>>()))
            .collect::<Result<Vec<_>, _>>()?;
        let opt_values = opt_cols.iter()
            .map(|(_, column)| column.str().map(|s| s.into_iter().collect::<Vec<_>>()))
            .collect::<Result<Vec<_>, _>>()?;

        let rows = (0..df.height())
            .map(|r| {
                let key = dep_values.iter()
                    .map(|values| values[r].map(|v| normalize(v).to_string()).unwrap_or_default())
                    .collect::<DepKey>();
                let probs = opt_values.iter().zip(opt_cols.iter())
                    .map(|(values, (opt, _))| {
                        let cell = values[r].map(normalize).unwrap_or("");
                        cell.parse::<f64>().map_err(|_| StockError::malformed(name, format!(
                            "row {r} option `{opt}` is not numeric: {cell:?}"
                        )))
                    })
                    .collect::<StockResult<Vec<_>>>()?;
                Ok((key, probs))
            })
            .collect::<StockResult<Vec<_>>>()?;

        Self::new(
            name,
            dep_cols.into_iter().map(|(dep, _)| dep).collect(),
            opt_cols.into_iter().map(|(opt, _)| opt).collect(),
            rows,
        )
    }

    #[inline] pub fn name(&self) -> &str { &self.name }

    /// Dependency attribute names, in column order.
    #[inline] pub fn dependencies(&self) -> &[String] { &self.dependencies }

    /// Option labels, in column order. This order defines the CDF walk.
    #[inline] pub fn options(&self) -> &[String] { &self.options }

    #[inline] pub fn len(&self) -> usize { self.keys.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.keys.is_empty() }

    /// Iterate (dependency tuple, option vector) rows in load order.
    pub fn rows(&self) -> impl Iterator<Item = (&DepKey, &[f64])> {
        self.keys.iter().zip(self.probs.iter().map(Vec::as_slice))
    }

    /// Return the option vector for an exact dependency tuple.
    pub fn lookup(&self, tuple: &[&str]) -> StockResult<&[f64]> {
        if tuple.len() != self.dependencies.len() {
            return Err(StockError::miss(&self.name, tuple));
        }
        let key = tuple.iter().map(|v| normalize(v).to_string()).collect::<DepKey>();
        self.index.get(&key)
            .map(|&i| self.probs[i].as_slice())
            .ok_or_else(|| StockError::miss(&self.name, tuple))
    }

    /// Look up the row selected by a running attribute map.
    pub fn lookup_with<'a>(&self, value_of: impl Fn(&str) -> Option<&'a str>) -> StockResult<&[f64]> {
        let tuple = self.dependencies.iter()
            .map(|dep| value_of(dep).ok_or_else(|| StockError::UnresolvableDependencies {
                remaining: vec![format!("{} (needs {dep})", self.name)],
            }))
            .collect::<StockResult<Vec<_>>>()?;
        self.lookup(&tuple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn fuel_table() -> ConditionalTable {
        ConditionalTable::new(
            "heating_fuel",
            vec!["building_type".into()],
            vec!["Electricity".into(), "NaturalGas".into()],
            vec![
                (smallvec!["Office".to_string()], vec![0.4, 0.6]),
                (smallvec!["Warehouse".to_string()], vec![1.0, 0.0]),
            ],
        ).unwrap()
    }

    #[test]
    fn lookup_exact_after_normalization() {
        let table = fuel_table();
        assert_eq!(table.lookup(&[" Office "]).unwrap(), &[0.4, 0.6]);
        assert_eq!(table.lookup(&["Warehouse"]).unwrap(), &[1.0, 0.0]);
    }

    #[test]
    fn lookup_missing_row_is_miss() {
        let table = fuel_table();
        assert!(matches!(table.lookup(&["Hospital"]), Err(StockError::DependencyMiss { .. })));
    }

    #[test]
    fn rejects_bad_sum() {
        let err = ConditionalTable::new(
            "t", vec![], vec!["A".into(), "B".into()],
            vec![(DepKey::new(), vec![0.5, 0.4])],
        ).unwrap_err();
        assert!(matches!(err, StockError::MalformedDistribution { .. }));
    }

    #[test]
    fn accepts_sum_within_tolerance() {
        let table = ConditionalTable::new(
            "t", vec![], vec!["A".into(), "B".into()],
            vec![(DepKey::new(), vec![0.5, 0.5 + 5e-7])],
        );
        assert!(table.is_ok());
    }

    #[test]
    fn rejects_duplicate_tuple() {
        let err = ConditionalTable::new(
            "t", vec!["a".into()], vec!["X".into()],
            vec![
                (smallvec!["1".to_string()], vec![1.0]),
                (smallvec!["1".to_string()], vec![1.0]),
            ],
        ).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn rejects_no_options() {
        let err = ConditionalTable::new("t", vec![], vec![], vec![]).unwrap_err();
        assert!(err.to_string().contains("no option columns"));
    }

    #[test]
    fn lookup_with_reports_missing_dependency() {
        let table = fuel_table();
        let err = table.lookup_with(|_| None).unwrap_err();
        assert!(matches!(err, StockError::UnresolvableDependencies { .. }));
    }
}
