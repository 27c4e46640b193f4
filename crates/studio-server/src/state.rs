//! Application State

use std::sync::Arc;

use studio_payments::{PaymentService, Result, StripeProcessor, SupabaseStore, WebhookVerifier};

use crate::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Intent creation, confirmation and settlement
    pub payments: PaymentService,

    /// Webhook verifier (optional - None if no webhook secret)
    pub webhooks: Option<Arc<WebhookVerifier>>,
}

impl AppState {
    pub fn new(payments: PaymentService, webhooks: Option<WebhookVerifier>) -> Self {
        Self {
            payments,
            webhooks: webhooks.map(Arc::new),
        }
    }

    /// Wire Stripe and Supabase from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let processor = Arc::new(StripeProcessor::new(&config.stripe_secret_key));
        let store = Arc::new(SupabaseStore::new(config.supabase.clone())?);

        Ok(Self::new(
            PaymentService::new(processor, store),
            config
                .stripe_webhook_secret
                .as_deref()
                .map(WebhookVerifier::new),
        ))
    }
}
