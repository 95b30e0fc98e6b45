//! # relay-pi
//!
//! Pi Network payment gateway for pi-relay.
//!
//! `PiNetworkClient` implements `relay_core::PaymentGateway` against the
//! Pi Platform payments API (`https://api.minepi.com/v2/payments`), sending
//! the server API key as `Authorization: Key <key>`.
//!
//! App-to-user payments additionally need the app wallet seed: the
//! client signs a native payment transaction and submits it to the Pi
//! Horizon API itself.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use relay_pi::PiNetworkClient;
//! use relay_core::PaymentGateway;
//!
//! // Create client from environment (PI_API_KEY, PI_WALLET_SEED)
//! let client = PiNetworkClient::from_env()?;
//!
//! let payment = client.approve_payment("payment_id").await?;
//! ```

pub mod client;
pub mod config;
pub mod horizon;
pub mod keypair;
pub mod xdr;

// Re-exports
pub use client::PiNetworkClient;
pub use config::PiConfig;
pub use horizon::HorizonClient;
pub use keypair::{Keypair, StrKeyError};
