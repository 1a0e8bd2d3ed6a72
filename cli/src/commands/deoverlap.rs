use anyhow::Result;
use stockgap::territory::{self, read_states, read_territories, CustomerTable, DeoverlapCache, EqualArea};
use tracing::info;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::DeoverlapArgs) -> Result<()> {
    let cache = DeoverlapCache::new(&args.cache, &args.input_version, &args.truth_data_version);
    let (territories, shapes) = cache.get_or_build(|| {
        let raw = read_territories(&args.territories)?;
        let states = read_states(&args.states)?;
        let customers = CustomerTable::read(&args.sales, &args.short_form)?;
        let projector = if args.projected { None } else { Some(EqualArea::new()?) };
        let result = territory::run(raw, &states, &customers, projector.as_ref())?;
        Ok((result.territories, result.ba_shapes))
    })?;
    info!(territories = territories.len(), ba_shapes = shapes.len(), dir = %cache.dir().display(), "deoverlap ready");
    Ok(())
}
