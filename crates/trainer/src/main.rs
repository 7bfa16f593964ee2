//! OptiFuel Trainer - Main Entry Point

use anyhow::Result;
use api::init_logging;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use trainer::{run_training, TrainingConfig};

#[derive(Parser)]
#[command(name = "optifuel-train")]
#[command(about = "Fit the fuel consumption model and write its serving artifacts")]
#[command(version)]
struct Cli {
    /// Voyage log CSV
    #[arg(long, default_value = "data/nigerian_fuel_consumption.csv")]
    data: PathBuf,
    /// Output directory for the artifacts
    #[arg(long, default_value = "artifacts")]
    artifacts: PathBuf,
    /// Held-out share of the rows
    #[arg(long, default_value_t = 0.2)]
    test_size: f64,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Ridge penalty
    #[arg(long, default_value_t = 1.0)]
    ridge: f64,
    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json)?;

    info!("=== OptiFuel Trainer v{} ===", env!("CARGO_PKG_VERSION"));

    let config = TrainingConfig {
        data_path: cli.data,
        artifacts_dir: cli.artifacts,
        test_size: cli.test_size,
        seed: cli.seed,
        ridge: cli.ridge,
        ..Default::default()
    };

    let report = run_training(&config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
