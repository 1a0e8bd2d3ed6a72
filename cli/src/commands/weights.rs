use anyhow::{Context, Result};
use stockgap::config::{OtherEuiChoice, Weighting};
use stockgap::profile::{energy_weights, other_eui_policy, AllocationWeights, EnergyBuilding, EuiTable};
use stockgap::territory::{read_structures, BaTractArea, DeoverlapCache, EqualArea};
use stockgap::RunConfig;
use tracing::info;

use crate::cli::WeightsArgs;

/// Weighting method and Other-EUI policy: command line first, then the [gap] section.
fn settings(args: &WeightsArgs, config: Option<&RunConfig>) -> Result<(Weighting, OtherEuiChoice)> {
    let weighting = match (args.weighting, config) {
        (Some(arg), _) => arg.into(),
        (None, Some(config)) => config.gap.weighting,
        (None, None) => anyhow::bail!("[weights] pass `area` or `energy`, or a --config with [gap] weighting"),
    };
    let policy = match (args.keep_other_eui, config) {
        (true, _) => OtherEuiChoice::Keep,
        (false, Some(config)) => config.gap.other_eui_policy,
        (false, None) => OtherEuiChoice::default(),
    };
    Ok((weighting, policy))
}

pub fn run(_cli: &crate::cli::Cli, args: &WeightsArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let (weighting, policy) = settings(args, config.as_ref())?;
    let weights = match weighting {
        Weighting::Area => area(args, config.as_ref())?,
        Weighting::Energy => energy(args, policy)?,
    };
    info!(bas = weights.len(), ?weighting, path = %args.output.display(), "writing allocation weights");
    weights.write_csv(&args.output)
}

fn area(args: &WeightsArgs, config: Option<&RunConfig>) -> Result<AllocationWeights> {
    let version = args.truth_data_version.as_deref().or(config.map(|c| c.truth_data_version.as_str()));
    let (Some(root), Some(version)) = (&args.cache, version) else {
        anyhow::bail!("[weights] area weighting needs --cache and a truth data version");
    };
    let cache = DeoverlapCache::new(root, &args.input_version, version);
    let (_, shapes) = cache.load()?
        .with_context(|| format!("[weights] no deoverlap output in {}; run `deoverlap` first", cache.dir().display()))?;

    let projector = EqualArea::new()?;
    let mut structures = Vec::new();
    for path in &args.structures {
        structures.extend(read_structures(path, &projector)?);
    }
    let table = BaTractArea::from_structures(&shapes, &structures);
    if let Some(path) = &args.table {
        table.write_parquet(path)?;
    }
    Ok(AllocationWeights::from_floor_area(&table)?)
}

fn energy(args: &WeightsArgs, policy: OtherEuiChoice) -> Result<AllocationWeights> {
    let (Some(buildings), Some(eui)) = (&args.buildings, &args.eui) else {
        anyhow::bail!("[weights] energy weighting needs --buildings and --eui");
    };
    let buildings = EnergyBuilding::read_csv(buildings)?;
    let table = EuiTable::read_csv(eui)?;
    Ok(energy_weights(&buildings, &table, other_eui_policy(policy).as_ref())?)
}
