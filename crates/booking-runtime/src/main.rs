//! # Booking Flow Service
//!
//! Serves the encrypted flow data-exchange endpoint.
//!
//! Configuration comes from the environment; see
//! `booking_runtime::container::config` for the variable list.

use anyhow::{Context, Result};
use booking_runtime::{shutdown_signal, BookingRuntime, RuntimeConfig};
use booking_telemetry::init_telemetry;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env().context("Failed to load configuration")?;

    let _telemetry = init_telemetry(config.telemetry.clone())
        .await
        .context("Failed to initialize telemetry")?;

    info!(?config, "Configuration loaded");

    let runtime = BookingRuntime::new(config)?;
    runtime.run(shutdown_signal()).await?;

    info!("Booking flow service stopped");
    Ok(())
}
