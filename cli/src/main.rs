mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{assign_tracts, deoverlap, gap, industrial, sample, upsample, weights};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match &cli.command {
        Commands::Sample(args) => sample::run(&cli, args),
        Commands::AssignTracts(args) => assign_tracts::run(&cli, args),
        Commands::Upsample(args) => upsample::run(&cli, args),
        Commands::Deoverlap(args) => deoverlap::run(&cli, args),
        Commands::Weights(args) => weights::run(&cli, args),
        Commands::Gap(args) => gap::run(&cli, args),
        Commands::Industrial(args) => industrial::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
