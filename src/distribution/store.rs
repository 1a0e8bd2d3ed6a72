use std::{collections::BTreeMap, path::Path};

use ahash::AHashMap;
use tracing::debug;
use walkdir::WalkDir;

use crate::{common, distribution::{json::parse_nested, table::ConditionalTable}, io};
use crate::error::{StockError, StockResult};

/// Read-only registry of conditional tables, keyed by attribute name.
/// Safe to share by reference once loading is complete.
#[derive(Debug, Default, Clone)]
pub struct DistributionStore {
    tables: AHashMap<String, ConditionalTable>,
    digests: BTreeMap<String, String>,
}

impl DistributionStore {
    pub fn new() -> Self { Self::default() }

    /// Register an already-built table under its own name.
    pub fn insert(&mut self, table: ConditionalTable) {
        self.tables.insert(table.name().to_string(), table);
    }

    /// Parse a tab-delimited table from bytes and register it as `name`.
    pub fn load_tsv_bytes(&mut self, name: &str, bytes: &[u8]) -> StockResult<()> {
        let df = io::csv::read_tsv_bytes(bytes)
            .map_err(|e| StockError::malformed(name, format!("{e:#}")))?;
        let table = ConditionalTable::from_dataframe(name, &df)?;
        self.digests.insert(name.to_string(), common::sha256_hex(bytes));
        self.insert(table);
        Ok(())
    }

    /// Parse the nested JSON form from text and register it as `name`.
    pub fn load_json_str(&mut self, name: &str, text: &str) -> StockResult<()> {
        let table = parse_nested(name, text)?;
        self.digests.insert(name.to_string(), common::sha256_hex(text.as_bytes()));
        self.insert(table);
        Ok(())
    }

    /// Load a table from a `.tsv` or `.json` file; the attribute name defaults to the file stem.
    pub fn load(&mut self, name: Option<&str>, path: &Path) -> StockResult<()> {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let name = name.unwrap_or(stem);
        let bytes = std::fs::read(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                let text = String::from_utf8(bytes)
                    .map_err(|e| StockError::malformed(name, format!("not UTF-8: {e}")))?;
                self.load_json_str(name, &text)
            }
            _ => self.load_tsv_bytes(name, &bytes),
        }
    }

    /// Load every `.tsv` / `.json` table found directly under `dir`, in file-name order.
    pub fn load_dir(dir: &Path) -> StockResult<Self> {
        let mut store = Self::new();
        let mut paths = WalkDir::new(dir).max_depth(1).sort_by_file_name().into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("tsv" | "json")))
            .peekable();

        if paths.peek().is_none() {
            return Err(StockError::Data(format!("no distribution tables under {}", dir.display())));
        }
        for path in paths {
            debug!(path = %path.display(), "loading distribution");
            store.load(None, &path)?;
        }
        Ok(store)
    }

    /// Get a table by attribute name.
    pub fn get(&self, name: &str) -> StockResult<&ConditionalTable> {
        self.tables.get(name).ok_or_else(|| StockError::UnresolvableDependencies {
            remaining: vec![format!("{name} (no distribution loaded)")],
        })
    }

    #[inline] pub fn contains(&self, name: &str) -> bool { self.tables.contains_key(name) }

    /// Dependency columns of an attribute's table.
    pub fn dependencies(&self, name: &str) -> StockResult<&[String]> {
        Ok(self.get(name)?.dependencies())
    }

    /// Option vector for `name` at an exact dependency tuple.
    pub fn lookup(&self, name: &str, tuple: &[&str]) -> StockResult<&[f64]> {
        self.get(name)?.lookup(tuple)
    }

    /// Attribute names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names = self.tables.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    /// SHA-256 of the source bytes of each table loaded from text.
    #[inline] pub fn digests(&self) -> &BTreeMap<String, String> { &self.digests }

    #[inline] pub fn len(&self) -> usize { self.tables.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.tables.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VINTAGE: &str = "Dependency=building_type\tOption=Pre1980\tOption=1980+\tsampling_probability\n\
                           Office\t0.3\t0.7\t0.5\n\
                           Warehouse\t0.6\t0.4\t0.5\n";

    #[test]
    fn loads_tsv_and_ignores_unprefixed_columns() {
        let mut store = DistributionStore::new();
        store.load_tsv_bytes("vintage", VINTAGE.as_bytes()).unwrap();
        let table = store.get("vintage").unwrap();
        assert_eq!(table.dependencies(), &["building_type".to_string()]);
        assert_eq!(table.options(), &["Pre1980".to_string(), "1980+".to_string()]);
        assert_eq!(store.lookup("vintage", &["Warehouse"]).unwrap(), &[0.6, 0.4]);
        assert_eq!(store.digests()["vintage"].len(), 64);
    }

    #[test]
    fn tsv_bad_sum_fails_at_load() {
        let mut store = DistributionStore::new();
        let text = "Option=A\tOption=B\n0.5\t0.6\n";
        let err = store.load_tsv_bytes("bad", text.as_bytes()).unwrap_err();
        assert!(matches!(err, StockError::MalformedDistribution { .. }));
        assert!(!store.contains("bad"));
    }

    #[test]
    fn loads_directory_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vintage.tsv"), VINTAGE).unwrap();
        std::fs::write(dir.path().join("building_type.json"),
            r#"{ "options": ["Office", "Warehouse"], "tree": { "Option=Office": 0.5, "Option=Warehouse": 0.5 } }"#
        ).unwrap();
        std::fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let store = DistributionStore::load_dir(dir.path()).unwrap();
        assert_eq!(store.names(), vec!["building_type", "vintage"]);
        assert_eq!(store.dependencies("building_type").unwrap().len(), 0);
    }

    #[test]
    fn unknown_table_is_unresolvable() {
        let store = DistributionStore::new();
        assert!(matches!(store.get("nope"), Err(StockError::UnresolvableDependencies { .. })));
    }
}
