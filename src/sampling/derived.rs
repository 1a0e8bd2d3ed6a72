//! Columns computed from sampled attributes rather than drawn.

use crate::error::{StockError, StockResult};
use crate::geography::{size_bin_of_label, SamplingRegions};
use crate::sampling::stock::Stock;
use crate::tracts::COUNTY;

pub const SAMPLING_REGION: &str = "sampling_region";
pub const BUILDING_AREA: &str = "building_area";
pub const SIZE_BIN: &str = "size_bin";

/// Add `sampling_region` from `county`. Every county must map.
pub fn add_sampling_region(stock: &mut Stock, regions: &SamplingRegions) -> StockResult<()> {
    let counties = stock.column(COUNTY)
        .ok_or_else(|| StockError::Data(format!("stock has no `{COUNTY}` column")))?;
    let values = regions.assign(counties)?.into_iter().map(|r| r.to_string()).collect();
    stock.set_column(SAMPLING_REGION, values);
    Ok(())
}

/// Add `size_bin` from the `building_area` option label.
pub fn add_size_bin(stock: &mut Stock) -> StockResult<()> {
    let areas = stock.column(BUILDING_AREA)
        .ok_or_else(|| StockError::Data(format!("stock has no `{BUILDING_AREA}` column")))?;
    let values = areas.iter()
        .map(|label| size_bin_of_label(label)
            .map(|bin| bin.to_string())
            .ok_or_else(|| StockError::Data(format!("unrecognized {BUILDING_AREA} label {label:?}"))))
        .collect::<StockResult<Vec<_>>>()?;
    stock.set_column(SIZE_BIN, values);
    Ok(())
}

/// Add whichever derived columns have become computable and are not yet present.
/// Returns the names added.
pub fn derive_columns(stock: &mut Stock, regions: Option<&SamplingRegions>) -> StockResult<Vec<&'static str>> {
    let mut added = Vec::new();
    if let Some(regions) = regions {
        if stock.has(COUNTY) && !stock.has(SAMPLING_REGION) {
            add_sampling_region(stock, regions)?;
            added.push(SAMPLING_REGION);
        }
    }
    if stock.has(BUILDING_AREA) && !stock.has(SIZE_BIN) {
        add_size_bin(stock)?;
        added.push(SIZE_BIN);
    }
    Ok(added)
}
