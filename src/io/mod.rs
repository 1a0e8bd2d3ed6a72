//! IO module for format-specific reading and writing operations.
//!
//! Operations are organized by format type rather than domain:
//!
//! - `csv` - CSV/TSV tables (conditional distributions, stocks, lookups)
//! - `parquet` - Parquet tables (profiles, gap matrices, caches)
//! - `wkb` - Well-Known Binary for territory geometry
//! - `shp` - Shapefile polygons and points

pub(crate) mod csv;
pub(crate) mod parquet;
pub(crate) mod shp;
pub(crate) mod wkb;
