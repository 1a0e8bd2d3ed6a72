//! Conditional-distribution tables and their read-only store.

mod json;
mod store;
mod table;

pub use json::parse_nested;
pub use store::DistributionStore;
pub use table::{ConditionalTable, DepKey, DEPENDENCY_PREFIX, OPTION_PREFIX, SUM_TOLERANCE};
