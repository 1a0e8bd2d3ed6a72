//! Hierarchical fallback assignment of missing census tracts.

mod assign;
mod cumulative;

pub use assign::{AssignmentLevel, AssignmentReport, TractAssigner, ASSIGNMENT_LEVEL, BUILDING_TYPE, COUNTY, TRACT};
pub use cumulative::CumulativeTable;
