use anyhow::Result;
use stockgap::config::GapConfig;
use stockgap::profile::{county_gap, read_demand_dir, read_offsets, AllocationWeights, ProfileSet, SectorProfiles};
use stockgap::RunConfig;
use tracing::info;

use crate::cli::GapArgs;

/// The [gap] section with command-line overrides applied.
fn settings(args: &GapArgs, config: Option<&RunConfig>) -> GapConfig {
    let mut gap = config.map(|c| c.gap.clone()).unwrap_or_default();
    if let Some(trim) = args.trim_negative_gap { gap.trim_negative_gap = trim }
    gap
}

pub fn run(_cli: &crate::cli::Cli, args: &GapArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let settings = settings(args, config.as_ref());

    let offsets = read_offsets(&args.offsets)?;
    let profiles = SectorProfiles {
        total: read_demand_dir(&args.total, &offsets, args.year)?,
        residential: ProfileSet::read_parquet(&args.residential)?,
        commercial: ProfileSet::read_parquet(&args.commercial)?,
        industrial: ProfileSet::read_parquet(&args.industrial)?,
    };
    let weights = AllocationWeights::read_csv(&args.weights)?;

    let counties = county_gap(profiles, &weights, &settings)?;
    info!(counties = counties.len(), trim_negative_gap = settings.trim_negative_gap, path = %args.output.display(), "writing county gap");
    counties.write_parquet(&args.output, args.year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Commands;
    use crate::commands::testing::{config, parse};

    fn args(extra: &[&str]) -> GapArgs {
        let base = [
            "gap", "--total", "demand", "--offsets", "o.csv", "--residential", "r.parquet",
            "--commercial", "c.parquet", "--industrial", "i.parquet", "--weights", "w.csv",
            "--year", "2019", "-o", "gap.parquet",
        ];
        match parse(&[&base[..], extra].concat()) {
            Commands::Gap(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn trim_follows_config_unless_overridden() {
        assert!(settings(&args(&[]), Some(&config())).trim_negative_gap);
        assert!(!settings(&args(&["--trim-negative-gap=false"]), Some(&config())).trim_negative_gap);
        assert!(!settings(&args(&[]), None).trim_negative_gap);
        assert!(settings(&args(&["--trim-negative-gap"]), None).trim_negative_gap);
    }
}
