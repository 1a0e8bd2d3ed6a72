//! Demand gap per BA and its redistribution to counties.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::config::GapConfig;
use crate::error::{StockError, StockResult};
use crate::profile::{calendar::HOURS, set::ProfileSet, weights::AllocationWeights};

/// Sector profiles alongside the reported total, all keyed by BA code.
#[derive(Debug, Clone, Default)]
pub struct SectorProfiles {
    pub total: ProfileSet,
    pub residential: ProfileSet,
    pub commercial: ProfileSet,
    pub industrial: ProfileSet,
}

impl SectorProfiles {
    fn sets(&self) -> [(&'static str, &ProfileSet); 4] {
        [
            ("total", &self.total),
            ("residential", &self.residential),
            ("commercial", &self.commercial),
            ("industrial", &self.industrial),
        ]
    }

    /// Restrict every set to the BAs present in all four. Fails if none are shared.
    pub fn align(&mut self) -> StockResult<Vec<String>> {
        let common = self.sets().iter()
            .map(|(_, set)| set.names().map(str::to_string).collect::<BTreeSet<_>>())
            .reduce(|a, b| a.intersection(&b).cloned().collect())
            .unwrap_or_default();
        if common.is_empty() {
            return Err(StockError::UnalignedProfileSet);
        }

        for (sector, set) in self.sets() {
            let dropped = set.names().filter(|ba| !common.contains(*ba)).collect::<Vec<_>>();
            if !dropped.is_empty() {
                warn!(sector, dropped = ?dropped, "dropping BAs missing from other sectors");
            }
        }
        let common = common.into_iter().collect::<Vec<_>>();
        for set in [&mut self.total, &mut self.residential, &mut self.commercial, &mut self.industrial] {
            set.retain(&common);
        }
        Ok(common)
    }

    /// Gap(ba, h) = total − (residential + commercial + industrial), optionally clamped
    /// to zero. Sets are aligned first.
    pub fn gap(mut self, trim_negative: bool) -> StockResult<ProfileSet> {
        let bas = self.align()?;
        let mut gap = ProfileSet::new();
        let mut clamped = 0usize;
        for ba in &bas {
            let column = |set: &ProfileSet| set.get(ba).map(<[f64]>::to_vec).ok_or(StockError::UnalignedProfileSet);
            let mut values = column(&self.total)?;
            for sector in [&self.residential, &self.commercial, &self.industrial] {
                for (v, s) in values.iter_mut().zip(column(sector)?) {
                    *v -= s;
                }
            }
            if trim_negative {
                for v in values.iter_mut().filter(|v| **v < 0.0) {
                    *v = 0.0;
                    clamped += 1;
                }
            }
            gap.insert(ba, values)?;
        }
        if trim_negative {
            debug!(clamped, "clamped negative gap hours");
        }
        Ok(gap)
    }
}

/// Spread each BA's gap over its counties by weight and sum within each county.
pub fn allocate(gap: &ProfileSet, weights: &AllocationWeights) -> StockResult<ProfileSet> {
    let unweighted = gap.names().filter(|ba| weights.counties(ba).is_none()).map(str::to_string).collect::<Vec<_>>();
    if !unweighted.is_empty() {
        return Err(StockError::CoverageGap { partition: "allocation weights".into(), entities: unweighted });
    }
    weights.validate()?;

    let mut counties = std::collections::BTreeMap::<&str, Vec<f64>>::new();
    for (ba, values) in gap.iter() {
        let Some(shares) = weights.counties(ba) else { continue };
        for (county, &w) in shares {
            let out = counties.entry(county.as_str()).or_insert_with(|| vec![0.0; HOURS]);
            for (o, v) in out.iter_mut().zip(values) {
                *o += v * w;
            }
        }
    }

    let mut allocated = ProfileSet::new();
    for (county, values) in counties {
        allocated.insert(county, values)?;
    }
    let drift = allocated.hourly_total().iter().zip(gap.hourly_total())
        .map(|(c, g)| (c - g).abs())
        .fold(0.0, f64::max);
    debug!(drift, "largest hourly difference between county and BA totals");
    info!(bas = gap.len(), counties = allocated.len(), "allocated gap to counties");
    Ok(allocated)
}

/// Gap per BA, trimmed as `config` asks, then allocated to counties.
pub fn county_gap(profiles: SectorProfiles, weights: &AllocationWeights, config: &GapConfig) -> StockResult<ProfileSet> {
    let gap = profiles.gap(config.trim_negative_gap)?;
    allocate(&gap, weights)
}
