//! # Service Container
//!
//! Builds every collaborator from a [`RuntimeConfig`] and wires them into
//! the gateway.
//!
//! ## Wiring
//!
//! ```text
//! StaticCatalog ─────────────┐
//! MeteredStore(InMemory) ────┼──→ FlowDispatcher ──┐
//! MeteredMessenger(CloudApi) ┘                     ├──→ FlowGatewayService
//! PrivateKeyMaterial (PEM) ────────────────────────┤
//! LoggingChatSink ─────────────────────────────────┘
//! ```

pub mod config;

pub use config::{ConfigError, KeyConfig, MessagingConfig, RuntimeConfig};

use anyhow::{Context, Result};
use bf_01_envelope_codec::PrivateKeyMaterial;
use bf_02_flow_dispatcher::{
    ConfirmationMessenger, FlowDispatcher, InMemoryAppointmentStore, LoggingMessenger,
    StaticCatalog, SystemTimeSource, TimeSource,
};
use bf_03_flow_gateway::{FlowGatewayService, LoggingChatSink};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use crate::adapters::{CloudApiMessenger, MeteredMessenger, MeteredStore};

/// Fully wired service graph.
pub struct ServiceContainer {
    /// HTTP gateway, ready to bind.
    pub gateway: FlowGatewayService,
    /// Backing appointment store.
    pub store: Arc<InMemoryAppointmentStore>,
    /// Configuration the graph was built from.
    pub config: RuntimeConfig,
}

impl ServiceContainer {
    /// Build with the system clock.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemTimeSource))
    }

    /// Build with a caller-supplied clock.
    #[instrument(name = "container_init", skip_all)]
    pub fn with_clock(config: RuntimeConfig, clock: Arc<dyn TimeSource>) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let private_key = Arc::new(load_private_key(&config.key)?);
        info!(path = %config.key.path.display(), "Flow private key loaded");

        let catalog = match &config.catalog_path {
            Some(path) => {
                let catalog = StaticCatalog::from_path(path).with_context(|| {
                    format!("Failed to load catalog from {}", path.display())
                })?;
                info!(path = %path.display(), "Catalog loaded");
                catalog
            }
            None => {
                info!("Using built-in catalog");
                StaticCatalog::default()
            }
        };

        let messenger = build_messenger(&config)?;

        let store = Arc::new(InMemoryAppointmentStore::new());
        let dispatcher = FlowDispatcher::new(
            config.dispatcher.clone(),
            Arc::new(catalog),
            Arc::new(MeteredStore::new(store.clone())),
            Arc::new(MeteredMessenger::new(messenger)),
            clock,
        );

        let gateway = FlowGatewayService::new(
            config.gateway.clone(),
            private_key,
            Arc::new(dispatcher),
            Arc::new(LoggingChatSink),
        )
        .context("Failed to build gateway")?;

        Ok(Self {
            gateway,
            store,
            config,
        })
    }
}

fn load_private_key(key: &KeyConfig) -> Result<PrivateKeyMaterial> {
    let pem = std::fs::read_to_string(&key.path)
        .with_context(|| format!("Failed to read private key {}", key.path.display()))?;
    PrivateKeyMaterial::from_pem(&pem, key.passphrase.as_deref())
        .with_context(|| format!("Failed to parse private key {}", key.path.display()))
}

fn build_messenger(config: &RuntimeConfig) -> Result<Arc<dyn ConfirmationMessenger>> {
    if !config.messaging.is_configured() {
        info!("Messaging credentials not set, confirmations will be logged only");
        return Ok(Arc::new(LoggingMessenger));
    }

    let timeout = Duration::from_millis(config.dispatcher.messaging_timeout_ms);
    let messenger = CloudApiMessenger::new(&config.messaging, timeout)
        .context("Failed to build messaging client")?;
    info!(api_version = %config.messaging.api_version, "Cloud API messenger configured");
    Ok(Arc::new(messenger))
}
