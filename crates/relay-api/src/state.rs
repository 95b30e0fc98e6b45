//! # Application State
//!
//! Shared state for the Axum application.
//! The gateway is built once here and injected into every service.

use anyhow::Context;
use relay_core::{BoxedGateway, PaymentLifecycle, TransferOrchestrator, TransferSettings};
use relay_pi::PiNetworkClient;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;

/// Default location of the optional relay settings file
pub const DEFAULT_RELAY_CONFIG: &str = "config/relay.toml";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Path of the TOML settings file
    pub relay_config_path: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            relay_config_path: std::env::var("RELAY_CONFIG")
                .unwrap_or_else(|_| DEFAULT_RELAY_CONFIG.to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid socket address {}:{}", self.host, self.port))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shape of `config/relay.toml`
#[derive(Debug, Default, Deserialize)]
struct RelayFile {
    #[serde(default)]
    transfer: TransferSettings,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Remote payment platform
    pub gateway: BoxedGateway,
    /// Approve/complete service
    pub lifecycle: PaymentLifecycle,
    /// A2U payout sequencing
    pub transfers: TransferOrchestrator,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState backed by the Pi Network gateway
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let settings = load_transfer_settings(&config.relay_config_path)?;

        let client = PiNetworkClient::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Pi Network client: {}", e))?;

        if client.wallet_address().is_none() {
            tracing::warn!("PI_WALLET_SEED not set, /send-pi will fail at submission");
        }

        Ok(Self::with_gateway(Arc::new(client), config, settings))
    }

    /// Assemble state around an explicit gateway
    pub fn with_gateway(gateway: BoxedGateway, config: AppConfig, settings: TransferSettings) -> Self {
        Self {
            lifecycle: PaymentLifecycle::new(gateway.clone()),
            transfers: TransferOrchestrator::new(gateway.clone(), settings),
            gateway,
            config,
        }
    }
}

/// Load transfer defaults from the TOML settings file, if present
fn load_transfer_settings(path: &str) -> anyhow::Result<TransferSettings> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => {
            tracing::info!("No relay config at {}, using default transfer settings", path);
            return Ok(TransferSettings::default());
        }
    };

    let file: RelayFile =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path))?;
    tracing::info!(
        "Loaded transfer settings from {}: memo={:?}, tag={:?}",
        path,
        file.transfer.default_memo,
        file.transfer.tag
    );
    Ok(file.transfer)
}
