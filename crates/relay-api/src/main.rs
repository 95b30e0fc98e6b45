//! # pi-relay
//!
//! Server-side relay for Pi Network payments.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export PI_API_KEY=...
//! export PI_WALLET_SEED=S...   # only needed for /send-pi
//!
//! # Run the server
//! pi-relay
//! ```

use relay_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // Print banner
    print_banner();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Payment provider: {}", state.gateway.provider_name());

    // Create router
    let app = routes::create_router(state);

    info!("✅ Server running on http://{}", addr);

    if !is_prod {
        info!("✔ Approve: POST http://{}/approve-payment", addr);
        info!("✔ Complete: POST http://{}/complete-payment", addr);
        info!("💸 Send: POST http://{}/send-pi", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `LOG_FORMAT=json` switches to JSON lines; filter comes from `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let json = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

fn print_banner() {
    println!(
        r#"
  π Pi Relay π
  ━━━━━━━━━━━━━━━━━━━━━━━
  Payment lifecycle relay
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
