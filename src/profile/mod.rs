//! Hourly profiles: calendar, gap computation, allocation weights.

mod calendar;
mod eui;
mod gap;
mod set;
mod weights;

pub use calendar::{hour_of_year, hourly_index, index_millis, is_leap_year, to_local, HOURS};
pub use eui::{base_euis, energy_weights, is_other_type, EnergyBuilding, EuiTable, KeepPolicy, OtherEuiPolicy, StateMixPolicy, OTHER_TYPES};
pub use gap::{allocate, county_gap, SectorProfiles};
pub use set::{align_readings, parse_utc, read_demand_csv, read_demand_dir, read_offsets, ProfileSet, DEMAND_MW, DEMAND_TIME, TIMESTAMP};
pub use weights::{county_of_census_code, AllocationWeights, WEIGHT_TOLERANCE};

use crate::config::OtherEuiChoice;

/// The correction policy selected in configuration.
pub fn other_eui_policy(choice: OtherEuiChoice) -> Box<dyn OtherEuiPolicy> {
    match choice {
        OtherEuiChoice::StateMix => Box::new(StateMixPolicy),
        OtherEuiChoice::Keep => Box::new(KeepPolicy),
    }
}
