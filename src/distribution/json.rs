//! Nested-mapping form of a conditional table, for sparse dependency spaces.
//!
//! ```json
//! {
//!   "dependencies": ["building_type", "census_division"],
//!   "options": ["Electricity", "NaturalGas"],
//!   "tree": {
//!     "Office": { "3": { "Option=Electricity": 0.4, "Option=NaturalGas": 0.6 } }
//!   }
//! }
//! ```
//!
//! Each nesting level consumes one dependency value. Leaves map `Option=<label>`
//! to a probability; labels absent from a leaf have probability zero.

use serde::Deserialize;
use serde_json::Value;

use crate::distribution::table::{normalize, ConditionalTable, DepKey, OPTION_PREFIX};
use crate::error::{StockError, StockResult};

#[derive(Deserialize)]
struct NestedTable {
    #[serde(default)]
    dependencies: Vec<String>,
    options: Vec<String>,
    tree: Value,
}

/// Parse the nested JSON form into a [`ConditionalTable`].
pub fn parse_nested(name: &str, text: &str) -> StockResult<ConditionalTable> {
    let nested: NestedTable = serde_json::from_str(text)
        .map_err(|e| StockError::malformed(name, format!("invalid JSON: {e}")))?;

    let mut rows = Vec::new();
    collect_leaves(name, &nested, &nested.tree, &mut DepKey::new(), &mut rows)?;

    ConditionalTable::new(
        name,
        nested.dependencies.iter().map(|d| normalize(d).to_string()).collect(),
        nested.options.iter()
            .map(|o| normalize(o.strip_prefix(OPTION_PREFIX).unwrap_or(o)).to_string())
            .collect(),
        rows,
    )
}

fn collect_leaves(
    name: &str,
    nested: &NestedTable,
    node: &Value,
    path: &mut DepKey,
    rows: &mut Vec<(DepKey, Vec<f64>)>,
) -> StockResult<()> {
    let object = node.as_object()
        .ok_or_else(|| StockError::malformed(name, format!("expected object at [{}]", path.join(", "))))?;

    if path.len() == nested.dependencies.len() {
        let mut probs = vec![0.0; nested.options.len()];
        for (key, value) in object {
            let label = key.strip_prefix(OPTION_PREFIX)
                .ok_or_else(|| StockError::malformed(name, format!("leaf key `{key}` lacks `{OPTION_PREFIX}`")))?;
            let slot = nested.options.iter()
                .position(|o| normalize(o.strip_prefix(OPTION_PREFIX).unwrap_or(o)) == normalize(label))
                .ok_or_else(|| StockError::malformed(name, format!("unknown option `{label}`")))?;
            probs[slot] = value.as_f64()
                .ok_or_else(|| StockError::malformed(name, format!("option `{label}` is not numeric")))?;
        }
        rows.push((path.clone(), probs));
        return Ok(());
    }

    for (key, child) in object {
        path.push(normalize(key).to_string());
        collect_leaves(name, nested, child, path, rows)?;
        path.pop();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_level_tree() {
        let text = r#"{
            "dependencies": ["building_type", "census_division"],
            "options": ["Electricity", "NaturalGas"],
            "tree": {
                "Office": {
                    "3": { "Option=Electricity": 0.4, "Option=NaturalGas": 0.6 },
                    "5": { "Option=Electricity": 1.0 }
                }
            }
        }"#;
        let table = parse_nested("heating_fuel", text).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup(&["Office", "3"]).unwrap(), &[0.4, 0.6]);
        assert_eq!(table.lookup(&["Office", "5"]).unwrap(), &[1.0, 0.0]);
    }

    #[test]
    fn parses_dependency_free_leaf() {
        let text = r#"{ "options": ["A", "B"], "tree": { "Option=A": 0.25, "Option=B": 0.75 } }"#;
        let table = parse_nested("t", text).unwrap();
        assert_eq!(table.lookup(&[]).unwrap(), &[0.25, 0.75]);
    }

    #[test]
    fn leaf_sum_is_validated() {
        let text = r#"{ "options": ["A", "B"], "tree": { "Option=A": 0.25, "Option=B": 0.5 } }"#;
        assert!(matches!(parse_nested("t", text), Err(StockError::MalformedDistribution { .. })));
    }

    #[test]
    fn unknown_option_is_rejected() {
        let text = r#"{ "options": ["A"], "tree": { "Option=Z": 1.0 } }"#;
        assert!(parse_nested("t", text).is_err());
    }
}
