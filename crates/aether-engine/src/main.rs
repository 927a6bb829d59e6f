//! Aether headless runner.

use aether_engine::{app, config::EngineConfig};
use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("aether=info".parse()?))
        .init();

    info!("Aether starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = EngineConfig::load();
    config.validate();

    let summary = app::run(&config)?;

    info!(
        "Aether shutdown complete at {}",
        summary
            .finished_at
            .map_or_else(|| "<not started>".to_string(), |at| at.to_string())
    );
    Ok(())
}
