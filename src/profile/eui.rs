//! Energy weighting: per-building annual energy from an EUI table.

use std::{collections::BTreeMap, path::Path};

use ahash::AHashMap;
use anyhow::Result;
use tracing::debug;

use crate::error::{StockError, StockResult};
use crate::geography::census_division;
use crate::io;
use crate::profile::weights::AllocationWeights;

/// Building types whose mix is unknown and whose EUI is subject to correction.
pub const OTHER_TYPES: [&str; 2] = ["Other", "general"];

#[inline]
pub fn is_other_type(building_type: &str) -> bool {
    OTHER_TYPES.iter().any(|t| t.eq_ignore_ascii_case(building_type.trim()))
}

/// Annual energy use intensity (kWh/ft²) by building type and census division.
#[derive(Debug, Clone, Default)]
pub struct EuiTable {
    values: AHashMap<(String, String), f64>,
}

impl EuiTable {
    pub fn from_rows(rows: impl IntoIterator<Item = (String, String, f64)>) -> Self {
        Self { values: rows.into_iter().map(|(t, d, v)| ((t, d), v)).collect() }
    }

    /// Read `{building_type, census_division, eui}` rows.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let df = io::csv::read_csv_strings(path)?;
        let types = io::csv::string_column(&df, "building_type")?;
        let divisions = io::csv::string_column(&df, "census_division")?;
        let euis = io::csv::float_column(&df, "eui")?;
        Ok(Self::from_rows(types.into_iter().zip(divisions).zip(euis)
            .filter_map(|((t, d), v)| v.map(|v| (t, d, v)))))
    }

    pub fn get(&self, building_type: &str, division: &str) -> Option<f64> {
        self.values.get(&(building_type.to_string(), division.to_string())).copied()
    }
}

/// One building (or sample row) contributing energy to a (BA, county) cell.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyBuilding {
    pub ba: String,
    pub county: String,
    pub state: String,
    pub building_type: String,
    pub floor_area: f64,
    /// How many real buildings this row represents.
    pub weight: f64,
}

impl EnergyBuilding {
    /// Read `{ba, county, state, building_type, floor_area[, weight]}` rows.
    pub fn read_csv(path: &Path) -> Result<Vec<Self>> {
        let df = io::csv::read_csv_strings(path)?;
        let bas = io::csv::string_column(&df, "ba")?;
        let counties = io::csv::string_column(&df, "county")?;
        let states = io::csv::string_column(&df, "state")?;
        let types = io::csv::string_column(&df, "building_type")?;
        let areas = io::csv::float_column(&df, "floor_area")?;
        let weights = match df.column("weight") {
            Ok(_) => io::csv::float_column(&df, "weight")?,
            Err(_) => vec![Some(1.0); df.height()],
        };
        Ok((0..df.height())
            .map(|i| EnergyBuilding {
                ba: bas[i].clone(),
                county: counties[i].clone(),
                state: states[i].clone(),
                building_type: types[i].clone(),
                floor_area: areas[i].unwrap_or(0.0),
                weight: weights[i].unwrap_or(1.0),
            })
            .collect())
    }

    #[inline] fn size(&self) -> f64 { self.floor_area * self.weight }
}

/// Correction applied to the EUI of buildings typed `Other`.
///
/// `euis` is aligned with `buildings`; entries for other-typed buildings may be NaN
/// when the table has no row for them.
pub trait OtherEuiPolicy {
    fn correct(&self, buildings: &[EnergyBuilding], euis: &mut [f64]);
}

/// Replace the EUI of other-typed buildings with the floor-area weighted mean EUI of
/// known-type buildings in the same state, assuming the unknown mix mirrors the known one.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateMixPolicy;

impl OtherEuiPolicy for StateMixPolicy {
    fn correct(&self, buildings: &[EnergyBuilding], euis: &mut [f64]) {
        let mut mix = BTreeMap::<&str, (f64, f64)>::new();
        for (b, &eui) in buildings.iter().zip(euis.iter()) {
            if is_other_type(&b.building_type) || !eui.is_finite() { continue }
            let entry = mix.entry(b.state.as_str()).or_default();
            entry.0 += eui * b.size();
            entry.1 += b.size();
        }
        for (b, eui) in buildings.iter().zip(euis.iter_mut()) {
            if !is_other_type(&b.building_type) { continue }
            if let Some(&(energy, area)) = mix.get(b.state.as_str()) {
                if area > 0.0 {
                    *eui = energy / area;
                }
            }
        }
        debug!(states = mix.len(), "applied state-mix EUI correction");
    }
}

/// Leave table EUIs untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepPolicy;

impl OtherEuiPolicy for KeepPolicy {
    fn correct(&self, _buildings: &[EnergyBuilding], _euis: &mut [f64]) {}
}

/// Base EUI of each building from the table; other-typed buildings without a row get NaN.
pub fn base_euis(buildings: &[EnergyBuilding], table: &EuiTable) -> StockResult<Vec<f64>> {
    buildings.iter()
        .map(|b| {
            let division = census_division(&b.state).ok_or_else(|| StockError::CoverageGap {
                partition: "census_division".into(),
                entities: vec![b.state.clone()],
            })?;
            match table.get(&b.building_type, division) {
                Some(eui) => Ok(eui),
                None if is_other_type(&b.building_type) => Ok(f64::NAN),
                None => Err(StockError::miss("eui", &[&b.building_type, division])),
            }
        })
        .collect()
}

/// Share of annual energy in each (BA, county).
pub fn energy_weights(
    buildings: &[EnergyBuilding],
    table: &EuiTable,
    policy: &dyn OtherEuiPolicy,
) -> StockResult<AllocationWeights> {
    let mut euis = base_euis(buildings, table)?;
    policy.correct(buildings, &mut euis);

    let unresolved = buildings.iter().zip(&euis)
        .filter(|(_, eui)| !eui.is_finite())
        .map(|(b, _)| format!("{} in {}", b.building_type, b.state))
        .collect::<std::collections::BTreeSet<_>>();
    if !unresolved.is_empty() {
        return Err(StockError::CoverageGap { partition: "eui".into(), entities: unresolved.into_iter().collect() });
    }

    AllocationWeights::from_amounts(buildings.iter().zip(&euis)
        .map(|(b, eui)| (b.ba.clone(), b.county.clone(), eui * b.size())))
}
