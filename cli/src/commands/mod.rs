pub mod assign_tracts;
pub mod deoverlap;
pub mod gap;
pub mod industrial;
pub mod sample;
pub mod upsample;
pub mod weights;

use std::path::Path;

use anyhow::Result;
use stockgap::RunConfig;

/// Parse `--config` when it was given.
pub fn load_config(path: Option<&Path>) -> Result<Option<RunConfig>> {
    path.map(RunConfig::from_toml_file).transpose()
}

#[cfg(test)]
pub(crate) mod testing {
    use clap::Parser;
    use stockgap::RunConfig;

    use crate::cli::{Cli, Commands};

    pub const CONFIG: &str = r#"
        truth_data_version = "v07"

        [sampling]
        seed = 42
        samples = 10
        generations = [["building_type"]]
        tsv_version = "2024-v1"
        year = 2019

        [tracts]
        tolerance = 0.05
        fail_on_missing = true

        [upsample]
        bootstrap = 5
        seed = 9

        [gap]
        trim_negative_gap = true
        weighting = "energy"
        other_eui_policy = "keep"
    "#;

    pub fn config() -> RunConfig {
        RunConfig::from_toml_str(CONFIG).unwrap()
    }

    pub fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(std::iter::once("stockgap").chain(args.iter().copied())).unwrap().command
    }
}
