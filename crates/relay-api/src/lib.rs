//! # relay-api
//!
//! HTTP API layer for pi-relay.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Payment lifecycle endpoints backed by an injected gateway
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/` | Health marker |
//! | GET | `/health` | Health check |
//! | POST | `/approve-payment` | Approve a U2A payment |
//! | POST | `/complete-payment` | Complete a U2A payment |
//! | POST | `/send-pi` | Send an A2U payment |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
