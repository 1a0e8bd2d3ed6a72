//! County partitions used as sampling strata.

use std::{collections::BTreeSet, path::Path};

use ahash::AHashMap;
use anyhow::{Context, Result};

use crate::error::{StockError, StockResult};
use crate::geography::{GeoId, GeoType};
use crate::io;

/// State prefix of California counties.
pub const CALIFORNIA: &str = "G06";

/// California sampling regions are derived from climate zones and occupy this range.
pub const CA_REGIONS: std::ops::RangeInclusive<u32> = 100..=110;

/// County to sampling-region lookup.
/// California counties go through their climate zone; all others map directly.
#[derive(Debug, Clone, Default)]
pub struct SamplingRegions {
    county_region: AHashMap<String, u32>,
    county_zone: AHashMap<String, u32>,
    zone_region: AHashMap<u32, u32>,
}

impl SamplingRegions {
    pub fn new(
        county_region: AHashMap<String, u32>,
        county_zone: AHashMap<String, u32>,
        zone_region: AHashMap<u32, u32>,
    ) -> StockResult<Self> {
        let stray = zone_region.iter()
            .filter(|(_, region)| !CA_REGIONS.contains(region))
            .map(|(zone, region)| format!("climate zone {zone} -> {region}"))
            .collect::<Vec<_>>();
        if !stray.is_empty() {
            return Err(StockError::Data(format!(
                "California regions must lie in {}..={}: {}", CA_REGIONS.start(), CA_REGIONS.end(), stray.join(", ")
            )));
        }
        Ok(Self { county_region, county_zone, zone_region })
    }

    /// Load the three lookups from CSV files with columns
    /// `{county, sampling_region}`, `{county, climate_zone}` and `{climate_zone, sampling_region}`.
    pub fn from_csv(county_region: &Path, county_zone: &Path, zone_region: &Path) -> Result<Self> {
        fn pairs(path: &Path, key: &str, value: &str) -> Result<Vec<(String, u32)>> {
            let df = io::csv::read_csv_strings(path)?;
            let keys = io::csv::string_column(&df, key)?;
            let values = io::csv::string_column(&df, value)?;
            keys.into_iter().zip(values)
                .map(|(k, v)| Ok((k, v.parse::<u32>()
                    .with_context(|| format!("[geography::region] bad {value} {v:?} in {}", path.display()))?)))
                .collect()
        }

        let zone_region = pairs(zone_region, "climate_zone", "sampling_region")?.into_iter()
            .map(|(zone, region)| Ok((zone.parse::<u32>()
                .with_context(|| format!("[geography::region] bad climate zone {zone:?}"))?, region)))
            .collect::<Result<_>>()?;

        Ok(Self::new(
            pairs(county_region, "county", "sampling_region")?.into_iter().collect(),
            pairs(county_zone, "county", "climate_zone")?.into_iter().collect(),
            zone_region,
        )?)
    }

    /// Sampling region of one county, if mapped.
    pub fn region(&self, county: &str) -> StockResult<Option<u32>> {
        let county = GeoId::new(GeoType::County, county).to_parent(GeoType::County)?;
        let region = if county.to_parent(GeoType::State)?.as_str() == CALIFORNIA {
            self.county_zone.get(county.as_str()).and_then(|zone| self.zone_region.get(zone)).copied()
        } else {
            self.county_region.get(county.as_str()).copied()
        };
        Ok(region)
    }

    /// Regions for every county, or a `CoverageGap` naming every unmapped county.
    pub fn assign<S: AsRef<str>>(&self, counties: &[S]) -> StockResult<Vec<u32>> {
        let mut missing = BTreeSet::new();
        let mut regions = Vec::with_capacity(counties.len());
        for county in counties {
            let region = self.region(county.as_ref())?.unwrap_or_else(|| {
                missing.insert(county.as_ref().to_string());
                0
            });
            regions.push(region);
        }
        if !missing.is_empty() {
            return Err(StockError::CoverageGap {
                partition: "sampling_region".into(),
                entities: missing.into_iter().collect(),
            });
        }
        Ok(regions)
    }
}
