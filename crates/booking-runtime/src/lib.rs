//! # Booking Runtime Library
//!
//! Exposes the runtime's wiring for tests. The entry point is the
//! `booking-runtime` binary.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Initialize telemetry (logs, optional OTLP traces, Prometheus registry)
//! 3. Load the flow private key and reference data
//! 4. Wire dispatcher and gateway
//! 5. Serve until Ctrl+C or SIGTERM, then drain in-flight requests

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod container;

pub use adapters::{CloudApiMessenger, MeteredMessenger, MeteredStore};
pub use container::{ConfigError, KeyConfig, MessagingConfig, RuntimeConfig, ServiceContainer};

use anyhow::{Context, Result};
use std::future::Future;
use tracing::info;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The running service.
pub struct BookingRuntime {
    container: ServiceContainer,
}

impl BookingRuntime {
    /// Wire the service graph.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        Ok(Self {
            container: ServiceContainer::new(config)?,
        })
    }

    /// From an already built container.
    pub fn from_container(container: ServiceContainer) -> Self {
        Self { container }
    }

    /// The wired services.
    pub fn container(&self) -> &ServiceContainer {
        &self.container
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = self
            .container
            .gateway
            .bind()
            .await
            .context("Failed to bind HTTP listener")?;

        info!("===========================================");
        info!("  Booking Flow Service v{}", VERSION);
        info!("  Listening on {}", self.container.config.gateway.http_addr());
        info!(
            "  Signature check: {}",
            if self.container.config.gateway.security.app_secret.is_some() {
                "enabled"
            } else {
                "disabled"
            }
        );
        info!("===========================================");

        self.container
            .gateway
            .serve(listener, shutdown)
            .await
            .context("HTTP server failed")?;

        info!(
            appointments = self.container.store.appointment_count(),
            "Gateway stopped"
        );
        Ok(())
    }
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
