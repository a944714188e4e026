//! Expression Monitor - Main Entry Point

use std::path::PathBuf;

use anyhow::Context;
use monitor::{init_logging, run, MonitorConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = MonitorConfig::load(config_path.as_deref())
        .context("loading monitor configuration")?;
    init_logging(&config.log)?;

    info!("=== Expression Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    run(config).await?;

    Ok(())
}
