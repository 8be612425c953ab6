//! Smart Trading Monitor binary.
//!
//! Follows one user's virtual trades until interrupted.

use anyhow::Context;
use smart_trading_monitor::{MonitorConfig, MonitorService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,smart_trading_monitor=debug,smart_trading_sdk=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MonitorConfig::from_env().context("invalid monitor configuration")?;

    tracing::info!("Starting Smart Trading Monitor");
    tracing::info!("User: {}", config.user_id);
    tracing::info!("Host: {} ({})", config.ws_host, config.scheme());

    let service = MonitorService::new(config)?;
    service
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("Shutting down monitor");
    Ok(())
}
