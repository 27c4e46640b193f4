//! Stripe PaymentIntents
//!
//! Implements the "Stripe Elements (Embedded)" approach: the server creates an
//! intent and hands its client secret to the browser, which collects the card.

use async_trait::async_trait;
use stripe::{
    Client, CreatePaymentIntent, CreatePaymentIntentAutomaticPaymentMethods, Currency,
    PaymentIntent, PaymentIntentId,
};

use super::{IntentParams, IntentStatus, PaymentProcessor, ProcessorIntent};
use crate::error::{PaymentError, Result};

/// Stripe client wrapper
pub struct StripeProcessor {
    client: Client,
}

impl StripeProcessor {
    /// Create a new Stripe processor
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    async fn create_intent(&self, params: &IntentParams) -> Result<ProcessorIntent> {
        let currency = params
            .currency
            .parse::<Currency>()
            .map_err(|_| PaymentError::Validation(format!("Unsupported currency: {}", params.currency)))?;

        let mut create = CreatePaymentIntent::new(params.amount, currency);
        create.automatic_payment_methods = Some(CreatePaymentIntentAutomaticPaymentMethods {
            allow_redirects: None,
            enabled: true,
        });
        create.metadata = Some(
            params
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );

        let intent = PaymentIntent::create(&self.client, create)
            .await
            .map_err(|e| PaymentError::Processor(e.to_string()))?;

        tracing::debug!(intent_id = %intent.id, amount = intent.amount, "Created Stripe payment intent");

        Ok(convert(intent))
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<ProcessorIntent> {
        let id = intent_id
            .parse::<PaymentIntentId>()
            .map_err(|e| PaymentError::Processor(format!("Invalid payment intent id {intent_id}: {e}")))?;

        let intent = PaymentIntent::retrieve(&self.client, &id, &[])
            .await
            .map_err(|e| PaymentError::Processor(e.to_string()))?;

        Ok(convert(intent))
    }

    fn name(&self) -> &str {
        "Stripe"
    }
}

fn convert(intent: PaymentIntent) -> ProcessorIntent {
    ProcessorIntent {
        id: intent.id.to_string(),
        client_secret: intent.client_secret,
        status: IntentStatus::parse(intent.status.as_str()),
        amount: intent.amount,
        currency: intent.currency.to_string(),
        payment_method_types: intent.payment_method_types,
    }
}
