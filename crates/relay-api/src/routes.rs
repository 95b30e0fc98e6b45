//! # Routes
//!
//! Axum router configuration for the relay API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  / - Plain-text health marker
/// - GET  /health - JSON health check
/// - POST /approve-payment - Approve a U2A payment
/// - POST /complete-payment - Complete a U2A payment
/// - POST /send-pi - Pay a user from the app wallet
pub fn create_router(state: AppState) -> Router {
    // Browser clients call the relay directly
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/approve-payment", post(handlers::approve_payment))
        .route("/complete-payment", post(handlers::complete_payment))
        .route("/send-pi", post(handlers::send_pi))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
