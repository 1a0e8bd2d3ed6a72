use std::path::PathBuf;

use stockgap::config::{Sizing, Weighting};

/// Building-stock sampling and load gap attribution
#[derive(clap::Parser, Debug)]
#[command(name = "stockgap", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Sample a building stock generation by generation
    Sample(SampleArgs),

    /// Fill missing census tracts by hierarchical fallback
    AssignTracts(AssignTractsArgs),

    /// Bootstrap a stock and draw HVAC system attributes
    Upsample(UpsampleArgs),

    /// Deoverlap utility service territories and dissolve BA shapes
    Deoverlap(DeoverlapArgs),

    /// Build per-BA county allocation weights
    Weights(WeightsArgs),

    /// Compute the demand gap and allocate it to counties
    Gap(GapArgs),

    /// Synthesize per-BA industrial hourly profiles
    Industrial(IndustrialArgs),
}

#[derive(clap::Args, Debug)]
pub struct SampleArgs {
    /// Run configuration (TOML)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Directory of conditional distribution tables (.tsv / .json)
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub tsv_dir: PathBuf,

    /// Output root; the run is written under <output>/<truth_data_version>
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: PathBuf,

    #[arg(long)]
    pub samples: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Simulation year
    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long)]
    pub sizing: Option<Sizing>,

    /// Version label of the distribution bundle
    #[arg(long)]
    pub tsv_version: Option<String>,

    /// County-region, county-climate-zone and climate-zone-region lookups (CSV)
    #[arg(long, num_args = 3, value_names = ["COUNTY_REGION", "COUNTY_ZONE", "ZONE_REGION"])]
    pub regions: Vec<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct AssignTractsArgs {
    /// Sampled stock CSV
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub stock: PathBuf,

    /// Census tract list CSV {county, tract, last6}
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub tract_list: PathBuf,

    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,

    /// Run configuration supplying the [tracts] section
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Defaults to the configured sampling seed, else 0
    #[arg(long)]
    pub seed: Option<u64>,

    /// Largest tolerated fraction of unassigned rows
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Fail instead of warning when the tolerance is exceeded
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub fail_on_missing: Option<bool>,
}

#[derive(clap::Args, Debug)]
pub struct UpsampleArgs {
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub stock: PathBuf,

    /// Heating fuel table conditioned on census division
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub fuel: PathBuf,

    /// HVAC system type table
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub hvac: PathBuf,

    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,

    /// Run configuration supplying the [upsample] section
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Bootstrap factor
    #[arg(long)]
    pub factor: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(clap::Args, Debug)]
pub struct DeoverlapArgs {
    /// Service territory polygons (shapefile)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub territories: PathBuf,

    /// State boundary polygons (shapefile)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub states: PathBuf,

    /// Sales to ultimate customers sheet (CSV export)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub sales: PathBuf,

    /// Short-form sheet (CSV export)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub short_form: PathBuf,

    /// Cache root
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub cache: PathBuf,

    #[arg(long)]
    pub truth_data_version: String,

    /// Version label of the territory and customer inputs
    #[arg(long, default_value = "1")]
    pub input_version: String,

    /// Inputs are already in an equal-area projection
    #[arg(long)]
    pub projected: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeightingArg {
    Area,
    Energy,
}

impl From<WeightingArg> for Weighting {
    fn from(arg: WeightingArg) -> Self {
        match arg {
            WeightingArg::Area => Weighting::Area,
            WeightingArg::Energy => Weighting::Energy,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct WeightsArgs {
    /// Defaults to `gap.weighting` from --config
    #[arg(value_enum)]
    pub weighting: Option<WeightingArg>,

    /// Weights CSV {ba, county, weight}
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,

    /// Run configuration supplying the [gap] section
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Cache root holding the deoverlapped BA shapes (area)
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub cache: Option<PathBuf>,

    /// Defaults to the configured truth data version (area)
    #[arg(long)]
    pub truth_data_version: Option<String>,

    #[arg(long, default_value = "1")]
    pub input_version: String,

    /// Structure point shapefiles (area)
    #[arg(long, num_args = 1.., value_hint = clap::ValueHint::FilePath)]
    pub structures: Vec<PathBuf>,

    /// Also write the BA-tract floor area table (area)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub table: Option<PathBuf>,

    /// Buildings CSV {ba, county, state, building_type, floor_area[, weight]} (energy)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub buildings: Option<PathBuf>,

    /// EUI table CSV {building_type, census_division, eui} (energy)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub eui: Option<PathBuf>,

    /// Keep table EUIs for buildings typed Other instead of the state mix
    #[arg(long)]
    pub keep_other_eui: bool,
}

#[derive(clap::Args, Debug)]
pub struct GapArgs {
    /// Directory of hourly demand CSVs, one per BA
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub total: PathBuf,

    /// UTC offsets CSV {ba, utc_offset}
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub offsets: PathBuf,

    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub residential: PathBuf,

    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub commercial: PathBuf,

    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub industrial: PathBuf,

    /// Weights CSV {ba, county, weight}
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub weights: PathBuf,

    #[arg(long)]
    pub year: i32,

    /// Run configuration supplying the [gap] section
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Clamp negative gap hours to zero
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub trim_negative_gap: Option<bool>,

    /// County-hour gap matrix (parquet)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct IndustrialArgs {
    /// Reference utility loads CSV {timestamp, <utility>...}
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub reference: PathBuf,

    /// Annual industrial sales CSV {ba, industrial_mwh}
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub sales: PathBuf,

    #[arg(long)]
    pub year: i32,

    /// Run configuration supplying regressor parameters
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,
}
