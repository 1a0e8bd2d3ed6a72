//! Census geography: identifiers, sampling strata, divisions and size bins.

mod division;
mod geo_id;
mod geo_type;
mod region;
mod size;

pub use division::census_division;
pub use geo_id::{is_valid_tract, join_tract, GeoId, LAST6};
pub use geo_type::GeoType;
pub use region::{SamplingRegions, CALIFORNIA, CA_REGIONS};
pub use size::{size_bin, size_bin_of_label, SIZE_BIN_EDGES};
