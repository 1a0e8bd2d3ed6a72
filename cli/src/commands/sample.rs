use anyhow::{Context, Result};
use stockgap::{geography::SamplingRegions, DistributionStore, RunConfig, StagedSampler};
use tracing::info;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::SampleArgs) -> Result<()> {
    let mut config = RunConfig::from_toml_file(&args.config)?;
    if let Some(samples) = args.samples { config.sampling.samples = samples }
    if let Some(seed) = args.seed { config.sampling.seed = seed }
    if let Some(year) = args.year { config.sampling.year = year }
    if let Some(sizing) = args.sizing { config.sampling.sizing = sizing }
    if let Some(version) = &args.tsv_version { config.sampling.tsv_version = version.clone() }
    config.validate().context("[sample] invalid configuration after command-line overrides")?;

    info!(dir = %args.tsv_dir.display(), "loading distributions");
    let store = DistributionStore::load_dir(&args.tsv_dir)?;
    info!(tables = store.len(), "loaded distributions");

    let mut sampler = StagedSampler::new(&store, &config.sampling, &config.truth_data_version)?;
    if let [county_region, county_zone, zone_region] = args.regions.as_slice() {
        sampler = sampler.with_regions(SamplingRegions::from_csv(county_region, county_zone, zone_region)?);
    }
    let out_dir = args.output.join(&config.truth_data_version);
    let stock = sampler.run(&out_dir)?;
    info!(rows = stock.len(), dir = %out_dir.display(), "wrote building stock");
    Ok(())
}
