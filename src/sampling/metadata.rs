use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{common, config::Sizing};

pub const METADATA_FILE: &str = "metadata.json";

/// Everything needed to reproduce (or resume) a sampling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub seed: u64,
    pub samples: usize,
    pub jitter: bool,
    pub generations: Vec<Vec<String>>,
    /// Per-generation column offsets, in resolved attribute order.
    pub offsets: Vec<Vec<f64>>,
    /// Resolved attribute order of each completed generation.
    pub resolved: Vec<Vec<String>>,
    pub tsv_version: String,
    pub truth_data_version: String,
    pub year: i32,
    pub sizing: Sizing,
    /// SHA-256 of every loaded distribution table.
    pub table_digests: BTreeMap<String, String>,
}

impl RunMetadata {
    #[inline] pub fn completed(&self) -> usize { self.resolved.len() }

    /// True if `other` describes the same run declaration, ignoring progress.
    pub fn same_run(&self, other: &RunMetadata) -> bool {
        self.seed == other.seed
            && self.samples == other.samples
            && self.jitter == other.jitter
            && self.generations == other.generations
            && self.tsv_version == other.tsv_version
            && self.truth_data_version == other.truth_data_version
            && self.table_digests == other.table_digests
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("[sampling::metadata] Failed to serialize")?;
        common::write_bytes_atomic(&dir.join(METADATA_FILE), text.as_bytes())
    }

    /// Read `metadata.json` from `dir`, if one exists.
    pub fn read(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(METADATA_FILE);
        if !path.exists() { return Ok(None) }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("[sampling::metadata] Failed to read {}", path.display()))?;
        let metadata = serde_json::from_str(&text)
            .with_context(|| format!("[sampling::metadata] Failed to parse {}", path.display()))?;
        Ok(Some(metadata))
    }
}
