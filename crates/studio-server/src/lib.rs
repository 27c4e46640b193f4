//! studio-server
//!
//! Axum router for the payment intent endpoints. `main.rs` wires real
//! Stripe and Supabase clients; tests wire in-memory ones.

pub mod config;
pub mod handlers;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{confirm_payment, create_payment_intent, health_check, stripe_webhook};
pub use crate::state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    // Browsers call these endpoints directly from the client site
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/confirm-payment", post(confirm_payment))
        .route("/webhook/stripe", post(stripe_webhook))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
