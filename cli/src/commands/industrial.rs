use anyhow::Result;
use stockgap::config::IndustrialConfig;
use stockgap::industrial::{read_sales, IndustrialSynthesizer, ReferenceLoads};
use stockgap::RunConfig;
use tracing::info;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::IndustrialArgs) -> Result<()> {
    let params = match &args.config {
        Some(path) => RunConfig::from_toml_file(path)?.industrial,
        None => IndustrialConfig::default(),
    };
    let reference = ReferenceLoads::read_csv(&args.reference)?;
    let sales = read_sales(&args.sales)?;

    let synthesizer = IndustrialSynthesizer::fit(&reference, &params)?;
    let profiles = synthesizer.profiles(args.year, &sales)?;
    info!(bas = profiles.len(), path = %args.output.display(), "writing industrial profiles");
    profiles.write_parquet(&args.output, args.year)
}
