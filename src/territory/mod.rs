//! Utility service territories: cleaning, deoverlap, BA dissolve and structure joins.

mod cache;
mod customers;
mod deoverlap;
mod polygon;
mod project;
mod structures;

pub use cache::{DeoverlapCache, BA_SHAPES_FILE, DENSITY, TERRITORIES_FILE};
pub use customers::{filter_rows, read_sheet, CustomerFilterCounts, CustomerRow, CustomerTable, ADJUSTMENT_ID};
pub use deoverlap::{
    attach_customers, clean_polygonal, dissolve, remove_duplicates, remove_overlaps, remove_slivers, run,
    split_by_state, DeoverlapReport, Deoverlapped, SLIVER_BUFFER,
};
pub use polygon::{read_states, read_territories, BaShape, RawTerritory, StateBoundary, Territory};
pub use project::{EqualArea, CONUS_ALBERS, NAD83};
pub use structures::{read_structures, BaTractArea, Sector, Structure, DEFAULT_HEIGHT};
