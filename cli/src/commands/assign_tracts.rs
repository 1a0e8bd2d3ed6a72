use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use stockgap::{config::TractConfig, tracts::TractAssigner, RunConfig, Stock};
use tracing::info;

use crate::cli::AssignTractsArgs;

/// The [tracts] section with command-line overrides applied, and the draw seed.
fn settings(args: &AssignTractsArgs, config: Option<&RunConfig>) -> (TractConfig, u64) {
    let mut tracts = config.map(|c| c.tracts.clone()).unwrap_or_default();
    if let Some(tolerance) = args.tolerance { tracts.tolerance = tolerance }
    if let Some(fail) = args.fail_on_missing { tracts.fail_on_missing = fail }
    let seed = args.seed.or(config.map(|c| c.sampling.seed)).unwrap_or(0);
    (tracts, seed)
}

pub fn run(_cli: &crate::cli::Cli, args: &AssignTractsArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let (tracts, seed) = settings(args, config.as_ref());
    anyhow::ensure!((0.0..=1.0).contains(&tracts.tolerance), "[assign-tracts] tolerance must lie in [0, 1]");

    let mut stock = Stock::read_csv(&args.stock)?;
    let census = TractAssigner::read_census_list(&args.tract_list)?;
    let assigner = TractAssigner::fit(&stock, &census)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let report = assigner.assign_checked(&mut stock, &mut rng, &tracts)?;
    info!(levels = ?report.levels, seed, "assigned tracts");

    stock.write_csv(&args.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Commands;
    use crate::commands::testing::{config, parse};

    fn args(extra: &[&str]) -> AssignTractsArgs {
        let base = ["assign-tracts", "--stock", "s.csv", "--tract-list", "t.csv", "-o", "out.csv"];
        match parse(&[&base[..], extra].concat()) {
            Commands::AssignTracts(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn tract_section_supplies_defaults() {
        let (tracts, seed) = settings(&args(&[]), Some(&config()));
        assert_eq!(tracts.tolerance, 0.05);
        assert!(tracts.fail_on_missing);
        assert_eq!(seed, 42);
    }

    #[test]
    fn flags_override_tract_section() {
        let (tracts, seed) = settings(&args(&["--tolerance", "0.2", "--fail-on-missing=false", "--seed", "3"]), Some(&config()));
        assert_eq!(tracts.tolerance, 0.2);
        assert!(!tracts.fail_on_missing);
        assert_eq!(seed, 3);
    }

    #[test]
    fn no_config_uses_builtin_defaults() {
        let (tracts, seed) = settings(&args(&["--fail-on-missing"]), None);
        assert_eq!(tracts.tolerance, 0.0);
        assert!(tracts.fail_on_missing);
        assert_eq!(seed, 0);
    }
}
