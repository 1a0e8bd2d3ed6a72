//! TOML run configuration.

use std::{fmt, path::Path, str::FromStr};

use ahash::AHashSet;
use anyhow::{bail, ensure, Context, Result};
use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Earliest simulation year with published inputs.
pub const FIRST_YEAR: i32 = 2012;

/// Top-level run configuration parsed from TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Namespace for every artifact and cache produced by the run.
    pub truth_data_version: String,
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub tracts: TractConfig,
    #[serde(default)]
    pub upsample: UpsampleConfig,
    #[serde(default)]
    pub gap: GapConfig,
    #[serde(default)]
    pub industrial: IndustrialConfig,
}

/// HVAC sizing mode passed through to the simulation inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sizing {
    #[default]
    Autosize,
    Hardsize,
}

impl FromStr for Sizing {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "autosize" => Ok(Sizing::Autosize),
            "hardsize" => Ok(Sizing::Hardsize),
            other => bail!("unknown sizing mode {other:?} (expected autosize or hardsize)"),
        }
    }
}

impl fmt::Display for Sizing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { Sizing::Autosize => "autosize", Sizing::Hardsize => "hardsize" })
    }
}

/// Staged Sobol sampling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplingConfig {
    pub seed: u64,
    pub samples: usize,
    #[serde(default = "default_true")]
    pub jitter: bool,
    /// Declared generations, in sampling order.
    pub generations: Vec<Vec<String>>,
    pub tsv_version: String,
    pub year: i32,
    #[serde(default)]
    pub sizing: Sizing,
}

/// Missing-tract fallback parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TractConfig {
    /// Largest tolerated fraction of rows left unassigned.
    pub tolerance: f64,
    /// Treat any unassigned row as an error instead of a warning.
    pub fail_on_missing: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpsampleConfig {
    pub bootstrap: usize,
    pub seed: u64,
}

impl Default for UpsampleConfig {
    fn default() -> Self {
        Self { bootstrap: 3, seed: 0 }
    }
}

/// How a BA's gap is split across counties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weighting {
    #[default]
    Area,
    Energy,
}

/// Which EUI correction applies to buildings typed `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtherEuiChoice {
    #[default]
    StateMix,
    Keep,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GapConfig {
    pub trim_negative_gap: bool,
    pub weighting: Weighting,
    pub other_eui_policy: OtherEuiChoice,
}

/// Gradient-boosting parameters for the industrial profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndustrialConfig {
    pub seed: u64,
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub subsample: f64,
}

impl Default for IndustrialConfig {
    fn default() -> Self {
        Self { seed: 0, n_estimators: 200, learning_rate: 0.1, max_depth: 3, subsample: 0.8 }
    }
}

fn default_true() -> bool { true }

impl RunConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("[config] Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("[config] Failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("[config] Invalid config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.sampling.validate()?;
        ensure!(!self.truth_data_version.trim().is_empty(), "truth_data_version must not be empty");
        ensure!(self.upsample.bootstrap >= 1, "upsample.bootstrap must be at least 1");
        ensure!((0.0..=1.0).contains(&self.tracts.tolerance), "tracts.tolerance must lie in [0, 1]");
        ensure!(self.industrial.n_estimators >= 1, "industrial.n_estimators must be at least 1");
        ensure!(self.industrial.learning_rate > 0.0, "industrial.learning_rate must be positive");
        ensure!(
            self.industrial.subsample > 0.0 && self.industrial.subsample <= 1.0,
            "industrial.subsample must lie in (0, 1]"
        );
        Ok(())
    }
}

impl SamplingConfig {
    pub fn validate(&self) -> Result<()> {
        let current = chrono::Local::now().year();
        ensure!(
            (FIRST_YEAR..=current).contains(&self.year),
            "sampling.year {} outside [{FIRST_YEAR}, {current}]", self.year
        );
        ensure!(self.samples >= 1, "sampling.samples must be at least 1");
        ensure!(!self.generations.is_empty(), "sampling.generations must declare at least one generation");

        let mut seen = AHashSet::new();
        for (i, generation) in self.generations.iter().enumerate() {
            ensure!(!generation.is_empty(), "generation {i} is empty");
            for attr in generation {
                ensure!(seen.insert(attr.as_str()), "attribute {attr:?} appears in more than one generation");
            }
        }
        Ok(())
    }

    /// All declared attributes, in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.generations.iter().flatten().map(String::as_str)
    }
}
