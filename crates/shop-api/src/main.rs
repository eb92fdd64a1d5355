//! # VoltShop
//!
//! Storefront API with session carts, coupon pricing and gateway invoicing.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export GATEWAY_MERCHANT_ACCOUNT=volt_shop_example_com
//! export GATEWAY_SECRET_KEY=...
//! export GATEWAY_DOMAIN=shop.example.com
//! export REDIS_URL=redis://127.0.0.1:6379   # optional, enables recommendations
//!
//! # Run the server
//! voltshop
//! ```

use shop_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    // Initialize application state
    let state = AppState::new().await?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Products loaded: {}", state.catalog.products.len());
    info!("Coupons loaded: {}", state.coupons.coupons.len());
    info!("Invoice currency: {}", state.config.currency);

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("🚀 VoltShop starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("🛒 Cart: GET http://{}/api/v1/cart", addr);
        info!("💳 Payment: POST http://{}/api/v1/payment/process", addr);
        info!("🔔 Callback: POST http://{}/webhook/invoice", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  ⚡ VoltShop ⚡
  ━━━━━━━━━━━━━━
  Storefront & invoicing API
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
