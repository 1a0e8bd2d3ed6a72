use std::path::Path;

use anyhow::{ensure, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::{common, config::SamplingConfig, distribution::DistributionStore, geography::SamplingRegions};
use crate::error::{StockError, StockResult};
use crate::sampling::{dag, derived, metadata::RunMetadata, sobol, stock::Stock};

/// File name of the persisted stock.
pub const STOCK_FILE: &str = "buildstock.csv";

/// Samples a building stock generation by generation against a distribution store.
#[derive(Debug)]
pub struct StagedSampler<'s> {
    store: &'s DistributionStore,
    config: SamplingConfig,
    truth_data_version: String,
    regions: Option<SamplingRegions>,
}

impl<'s> StagedSampler<'s> {
    /// Check that every declared attribute has a table before any sampling starts.
    pub fn new(store: &'s DistributionStore, config: &SamplingConfig, truth_data_version: &str) -> StockResult<Self> {
        let missing = config.attributes()
            .filter(|a| !store.contains(a))
            .map(|a| format!("{a} (no distribution loaded)"))
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(StockError::UnresolvableDependencies { remaining: missing });
        }
        if config.samples == 0 {
            return Err(StockError::Sampling("sample count must be at least 1".into()));
        }
        Ok(Self { store, config: config.clone(), truth_data_version: truth_data_version.to_string(), regions: None })
    }

    /// Derive `sampling_region` from `county` as soon as a generation produces it.
    pub fn with_regions(mut self, regions: SamplingRegions) -> Self {
        self.regions = Some(regions);
        self
    }

    #[inline] pub fn config(&self) -> &SamplingConfig { &self.config }

    /// Column offsets for every generation, drawn up front from the run's single RNG.
    /// All zeros when jitter is disabled.
    pub fn offsets(&self) -> Vec<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        self.config.generations.iter()
            .map(|g| g.iter().map(|_| if self.config.jitter { rng.random::<f64>() } else { 0.0 }).collect())
            .collect()
    }

    /// Sample one generation against the current stock. Returns the resolved order and
    /// one column of option labels per attribute in that order.
    pub fn sample_generation(
        &self,
        stock: &Stock,
        generation: &[String],
        offsets: &[f64],
    ) -> StockResult<(Vec<String>, Vec<Vec<String>>)> {
        if generation.is_empty() {
            return Err(StockError::Sampling("cannot sample an empty generation".into()));
        }
        let order = dag::resolve_in(self.store, generation, stock.attributes())?;
        let tables = order.iter().map(|a| self.store.get(a)).collect::<StockResult<Vec<_>>>()?;

        let mut points = sobol::sobol(order.len(), stock.len())?;
        sobol::apply_offsets(&mut points, offsets);

        let mut picks = vec![Vec::with_capacity(stock.len()); order.len()];
        for (i, point) in points.rows().into_iter().enumerate() {
            let mut row = SmallVec::<[usize; 16]>::new();
            for (j, table) in tables.iter().enumerate() {
                let value_of = |dep: &str| match order[..j].iter().position(|a| a == dep) {
                    Some(k) => Some(tables[k].options()[row[k]].as_str()),
                    None => stock.value(i, dep),
                };
                let probs = table.lookup_with(value_of)?;
                let choice = sobol::invert(probs, point[j])
                    .ok_or_else(|| StockError::malformed(table.name(), "row has no positive option"))?;
                row.push(choice);
                picks[j].push(choice);
            }
        }

        let columns = tables.iter().zip(picks)
            .map(|(table, picks)| picks.into_iter().map(|k| table.options()[k].clone()).collect())
            .collect();
        Ok((order, columns))
    }

    /// Sample every generation in memory.
    pub fn sample(&self) -> StockResult<Stock> {
        let mut stock = Stock::new(self.config.samples);
        for (generation, offsets) in self.config.generations.iter().zip(self.offsets()) {
            let (order, columns) = self.sample_generation(&stock, generation, &offsets)?;
            for (name, values) in order.iter().zip(columns) {
                stock.set_column(name, values);
            }
            derived::derive_columns(&mut stock, self.regions.as_ref())?;
        }
        Ok(stock)
    }

    fn metadata(&self, offsets: Vec<Vec<f64>>) -> RunMetadata {
        RunMetadata {
            seed: self.config.seed,
            samples: self.config.samples,
            jitter: self.config.jitter,
            generations: self.config.generations.clone(),
            offsets,
            resolved: Vec::new(),
            tsv_version: self.config.tsv_version.clone(),
            truth_data_version: self.truth_data_version.clone(),
            year: self.config.year,
            sizing: self.config.sizing,
            table_digests: self.store.digests().clone(),
        }
    }

    /// Sample into `dir`, persisting `buildstock.csv` and `metadata.json` after every
    /// generation. A matching earlier run in `dir` resumes after its last completed
    /// generation; anything else starts over.
    pub fn run(&self, dir: &Path) -> Result<Stock> {
        common::ensure_dir_exists(dir)?;
        let removed = common::remove_stale_temps(dir)?;
        if removed > 0 {
            info!(removed, dir = %dir.display(), "removed temporary files from an interrupted run");
        }

        let offsets = self.offsets();
        let mut metadata = self.metadata(offsets.clone());
        let stock_path = dir.join(STOCK_FILE);

        let mut stock = match RunMetadata::read(dir)? {
            Some(prior) if prior.same_run(&metadata) && stock_path.exists() => {
                let stock = Stock::read_csv(&stock_path)?;
                ensure!(stock.len() == self.config.samples,
                    "[sampling::driver] {} has {} rows, expected {}", stock_path.display(), stock.len(), self.config.samples);
                info!(completed = prior.completed(), "resuming sampling run");
                metadata.resolved = prior.resolved;
                stock
            }
            _ => Stock::new(self.config.samples),
        };

        for g in metadata.completed()..self.config.generations.len() {
            let generation = &self.config.generations[g];
            info!(generation = g, attributes = generation.len(), rows = stock.len(), "sampling generation");
            let (order, columns) = self.sample_generation(&stock, generation, &offsets[g])?;
            for (name, values) in order.iter().zip(columns) {
                stock.set_column(name, values);
            }
            let added = derived::derive_columns(&mut stock, self.regions.as_ref())?;
            debug!(generation = g, order = ?order, derived = ?added, "resolved generation");

            stock.write_csv(&stock_path)?;
            metadata.resolved.push(order);
            metadata.write(dir)?;
        }
        info!(path = %stock_path.display(), rows = stock.len(), "sampling complete");
        Ok(stock)
    }
}
