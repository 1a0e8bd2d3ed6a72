//! Staged quasi-random sampling of a building stock from conditional tables.

pub mod dag;
mod derived;
mod direction;
mod driver;
mod metadata;
pub mod sobol;
mod stock;

pub use dag::{resolve, resolve_in};
pub use derived::{add_sampling_region, add_size_bin, derive_columns, BUILDING_AREA, SAMPLING_REGION, SIZE_BIN};
pub use driver::{StagedSampler, STOCK_FILE};
pub use metadata::{RunMetadata, METADATA_FILE};
pub use sobol::{apply_offsets, invert, jitter, sobol, MAX_DIMENSION};
pub use stock::{Stock, BUILDING, NA};
