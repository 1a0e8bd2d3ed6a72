use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use stockgap::config::UpsampleConfig;
use stockgap::{upsample::{Upsampler, HEATING_FUEL, SYSTEM_TYPE}, DistributionStore, RunConfig, Stock};
use tracing::info;

use crate::cli::UpsampleArgs;

/// The [upsample] section with command-line overrides applied.
fn settings(args: &UpsampleArgs, config: Option<&RunConfig>) -> UpsampleConfig {
    let mut upsample = config.map(|c| c.upsample.clone()).unwrap_or_default();
    if let Some(factor) = args.factor { upsample.bootstrap = factor }
    if let Some(seed) = args.seed { upsample.seed = seed }
    upsample
}

pub fn run(_cli: &crate::cli::Cli, args: &UpsampleArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let settings = settings(args, config.as_ref());

    let stock = Stock::read_csv(&args.stock)?;
    let mut store = DistributionStore::new();
    store.load(Some(HEATING_FUEL), &args.fuel)?;
    store.load(Some(SYSTEM_TYPE), &args.hvac)?;

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let upsampler = Upsampler::new(store.get(HEATING_FUEL)?, store.get(SYSTEM_TYPE)?, settings.bootstrap);
    let upsampled = upsampler.run(&stock, &mut rng)?;
    info!(before = stock.len(), after = upsampled.len(), seed = settings.seed, "upsampled stock");

    upsampled.write_csv(&args.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Commands;
    use crate::commands::testing::{config, parse};

    fn args(extra: &[&str]) -> UpsampleArgs {
        let base = ["upsample", "--stock", "s.csv", "--fuel", "f.tsv", "--hvac", "h.tsv", "-o", "out.csv"];
        match parse(&[&base[..], extra].concat()) {
            Commands::Upsample(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn upsample_section_and_overrides() {
        let from_config = settings(&args(&[]), Some(&config()));
        assert_eq!((from_config.bootstrap, from_config.seed), (5, 9));

        let overridden = settings(&args(&["--factor", "2"]), Some(&config()));
        assert_eq!((overridden.bootstrap, overridden.seed), (2, 9));

        let defaults = settings(&args(&[]), None);
        assert_eq!((defaults.bootstrap, defaults.seed), (stockgap::upsample::DEFAULT_FACTOR, 0));
    }
}
