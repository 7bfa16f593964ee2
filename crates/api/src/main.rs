//! OptiFuel Prediction API - Main Entry Point

use api::{init_logging, run_server, ServiceConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::load()?;
    init_logging(config.log_json)?;

    info!("=== OptiFuel API v{} ===", env!("CARGO_PKG_VERSION"));

    run_server(config).await?;

    Ok(())
}
