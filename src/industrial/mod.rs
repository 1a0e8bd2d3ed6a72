//! Industrial hourly profiles synthesized from reference utility loads.

mod features;
mod gbm;
mod synth;

pub use features::{feature_matrix, features_of, holidays, is_off_day, FEATURES};
pub use gbm::{GbmNode, GbmRegressor, GbmTree};
pub use synth::{read_sales, unitize, IndustrialSynthesizer, ReferenceLoads, INDUSTRIAL_SALES};
