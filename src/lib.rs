#![doc = "Stochastic building-stock apportionment and load gap attribution"]
mod common;
mod io;

pub mod config;
pub mod distribution;
pub mod error;
pub mod geography;
pub mod industrial;
pub mod profile;
pub mod sampling;
pub mod territory;
pub mod tracts;
pub mod upsample;

#[doc(inline)]
pub use config::RunConfig;

#[doc(inline)]
pub use distribution::{ConditionalTable, DistributionStore};

#[doc(inline)]
pub use error::{StockError, StockResult};

#[doc(inline)]
pub use sampling::{StagedSampler, Stock};
