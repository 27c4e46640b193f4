//! HTTP Handlers

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
};
use serde::{Serialize, de::DeserializeOwned};

use studio_payments::{
    ConfirmRequest, ConfirmedPayment, CreateIntentRequest, CreatedIntent, PaymentError,
    RequestAuth,
};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub webhooks_enabled: bool,
}

// ============================================================================
// Helpers
// ============================================================================

/// Forward the caller's `Authorization` header to the store
fn caller_auth(headers: &HeaderMap) -> RequestAuth {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map_or_else(RequestAuth::service, |header| RequestAuth::forwarded(header))
}

/// An empty body reads as an empty object so field validation reports it.
fn parse_body<T: DeserializeOwned + Default>(body: &str) -> Result<T, PaymentError> {
    if body.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(body)
        .map_err(|e| PaymentError::Validation(format!("Invalid request body: {e}")))
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        webhooks_enabled: state.webhooks.is_some(),
    })
}

/// Create a payment intent and its pending payment row
pub async fn create_payment_intent(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<CreatedIntent>, PaymentError> {
    let request: CreateIntentRequest = parse_body(&body).inspect_err(|e| {
        tracing::warn!(error = %e, "Rejected payment intent request body");
    })?;

    state
        .payments
        .create_intent(&caller_auth(&headers), &request)
        .await
        .map(Json)
        .inspect_err(|e| {
            tracing::error!(
                error = %e,
                project_id = ?request.project_id,
                client_id = ?request.client_id,
                "Error creating payment intent"
            );
        })
}

/// Confirm a payment intent that succeeded at the processor
pub async fn confirm_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<ConfirmedPayment>, PaymentError> {
    let request: ConfirmRequest = parse_body(&body).inspect_err(|e| {
        tracing::warn!(error = %e, "Rejected confirmation request body");
    })?;

    state
        .payments
        .confirm(&caller_auth(&headers), &request)
        .await
        .map(Json)
        .inspect_err(|e| {
            tracing::error!(
                error = %e,
                intent_id = ?request.payment_intent_id,
                "Error confirming payment"
            );
        })
}

/// Stripe webhook handler
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, PaymentError> {
    let event = state
        .webhooks
        .as_ref()
        .ok_or(PaymentError::WebhooksDisabled)
        .and_then(|verifier| {
            let signature = headers
                .get("stripe-signature")
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| PaymentError::WebhookSignature("Missing Stripe signature".into()))?;
            verifier.construct_event(&body, signature)
        })
        .inspect_err(|e| tracing::warn!(error = %e, code = e.code(), "Webhook rejected"))?;

    tracing::info!(event = ?event, "Processing Stripe webhook");

    state
        .payments
        .apply_webhook(&event)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Webhook processing error"))?;

    Ok(StatusCode::OK)
}
