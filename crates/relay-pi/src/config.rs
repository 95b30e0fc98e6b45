//! # Pi Network Configuration
//!
//! Configuration for the Pi Platform API and the Horizon ledger API.
//! All secrets are loaded from environment variables.

use relay_core::PaymentError;
use std::env;
use std::fmt;

/// Pi Platform API root
pub const DEFAULT_API_BASE_URL: &str = "https://api.minepi.com/v2";

/// Horizon host for the "Pi Network" (mainnet) ledger
pub const MAINNET_HORIZON_URL: &str = "https://api.mainnet.minepi.com";

/// Horizon host for every other network (testnet)
pub const TESTNET_HORIZON_URL: &str = "https://api.testnet.minepi.com";

/// Passphrase of the mainnet ledger, as reported in `payment.network`
pub const MAINNET_PASSPHRASE: &str = "Pi Network";

/// Default outbound request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Pi Network API configuration
#[derive(Clone)]
pub struct PiConfig {
    /// Server API key from the Pi developer portal
    pub api_key: String,

    /// App wallet secret seed (S...), needed to submit A2U payments
    pub wallet_seed: Option<String>,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// Horizon URL override; derived from the payment network when unset
    pub horizon_url: Option<String>,

    /// Outbound request timeout in seconds
    pub timeout_secs: u64,
}

impl PiConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `PI_API_KEY`
    ///
    /// Optional:
    /// - `PI_WALLET_SEED`
    /// - `PI_API_BASE_URL`
    /// - `PI_HORIZON_URL`
    pub fn from_env() -> Result<Self, PaymentError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_key = env::var("PI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| PaymentError::Configuration("PI_API_KEY not set".to_string()))?;

        let wallet_seed = env::var("PI_WALLET_SEED")
            .ok()
            .filter(|s| !s.trim().is_empty());

        if let Some(ref seed) = wallet_seed {
            if !seed.starts_with('S') || seed.len() != 56 {
                return Err(PaymentError::Configuration(
                    "PI_WALLET_SEED must be a 56 character secret seed starting with S".to_string(),
                ));
            }
        }

        let mut config = Self::new(api_key);
        config.wallet_seed = wallet_seed;

        if let Ok(url) = env::var("PI_API_BASE_URL") {
            config = config.with_api_base_url(url);
        }
        if let Ok(url) = env::var("PI_HORIZON_URL") {
            config = config.with_horizon_url(url);
        }

        Ok(config)
    }

    /// Create config with explicit values (for testing)
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            wallet_seed: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            horizon_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Key {}", self.api_key)
    }

    /// Payments collection URL
    pub fn payments_url(&self) -> String {
        format!("{}/payments", self.api_base_url.trim_end_matches('/'))
    }

    /// Horizon host for the ledger a payment lives on
    pub fn horizon_url_for(&self, network: &str) -> String {
        match &self.horizon_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if network == MAINNET_PASSPHRASE => MAINNET_HORIZON_URL.to_string(),
            None => TESTNET_HORIZON_URL.to_string(),
        }
    }

    /// Check if an app wallet is configured
    pub fn can_submit(&self) -> bool {
        self.wallet_seed.is_some()
    }

    /// Builder: set the wallet seed
    pub fn with_wallet_seed(mut self, seed: impl Into<String>) -> Self {
        self.wallet_seed = Some(seed.into());
        self
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Builder: pin the Horizon URL (for testing)
    pub fn with_horizon_url(mut self, url: impl Into<String>) -> Self {
        self.horizon_url = Some(url.into());
        self
    }
}

impl fmt::Debug for PiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PiConfig")
            .field("api_key", &"<redacted>")
            .field("wallet_seed", &self.wallet_seed.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("horizon_url", &self.horizon_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
