//! studio-server
//!
//! Axum-based server for the payment intent lifecycle: intent creation,
//! client-triggered confirmation, and Stripe webhooks.

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studio_server::{AppState, app, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let state = AppState::from_config(&config)?;

    if state.webhooks.is_some() {
        tracing::info!("✓ Stripe webhooks enabled");
    } else {
        tracing::warn!("⚠ Stripe webhooks disabled - set STRIPE_WEBHOOK_SECRET in .env");
        tracing::warn!("  Payments settle only through /confirm-payment");
    }
    tracing::info!(supabase_url = %config.supabase.url, "Payment store configured");

    let listener = TcpListener::bind(config.bind_addr).await?;

    tracing::info!("studio-server running on http://{}", config.bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                - Health check");
    tracing::info!("  POST /create-payment-intent - Create Stripe payment intent");
    tracing::info!("  POST /confirm-payment       - Confirm succeeded payment");
    tracing::info!("  POST /webhook/stripe        - Stripe webhook");

    axum::serve(listener, app(state)).await?;

    Ok(())
}
