//! Payment Intent Lifecycle
//!
//! Creates intents, confirms them, and settles payment rows. Every terminal
//! write goes through [`PaymentService::settle`], which only moves rows out of
//! `pending`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{PaymentError, Result};
use crate::model::{NewPayment, Payment, PaymentStatus, PaymentType, Settlement};
use crate::processor::{IntentParams, IntentStatus, PaymentProcessor};
use crate::store::{PaymentStore, RequestAuth};
use crate::webhook::WebhookEvent;

/// Currency used when the caller does not name one
pub const DEFAULT_CURRENCY: &str = "cad";

/// Body of `POST /create-payment-intent`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    #[serde(default)]
    pub amount: Option<f64>,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub payment_type: Option<String>,

    /// Extra tags for the intent
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, Value>>,
}

/// Result of creating an intent
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedIntent {
    pub client_secret: String,
    pub payment_intent_id: String,
    pub amount: i64,
    pub currency: String,
    /// Processor-side intent status
    pub status: String,
    /// Store id of the new payment row
    pub payment_id: String,
}

/// Body of `POST /confirm-payment`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    #[serde(default)]
    pub payment_intent_id: Option<String>,
}

/// Result of a confirmation
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedPayment {
    pub success: bool,
    pub payment_id: String,
    pub status: PaymentStatus,
    pub amount: i64,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<Payment> for ConfirmedPayment {
    fn from(payment: Payment) -> Self {
        Self {
            success: true,
            payment_id: payment.id,
            status: payment.status,
            amount: payment.amount,
            processed_at: payment.processed_at,
        }
    }
}

/// A create request that passed validation
#[derive(Clone, Debug, PartialEq)]
struct ValidIntent {
    amount: i64,
    currency: String,
    project_id: String,
    client_id: String,
    payment_type: PaymentType,
    metadata: BTreeMap<String, String>,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

impl CreateIntentRequest {
    fn validate(&self) -> Result<ValidIntent> {
        let amount = self.amount.filter(|a| *a != 0.0 && !a.is_nan());
        let project_id = present(self.project_id.as_ref());
        let client_id = present(self.client_id.as_ref());
        let payment_type = present(self.payment_type.as_ref());

        let missing: Vec<&str> = [
            ("amount", amount.is_none()),
            ("projectId", project_id.is_none()),
            ("clientId", client_id.is_none()),
            ("paymentType", payment_type.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(amount), Some(project_id), Some(client_id), Some(payment_type)) =
            (amount, project_id, client_id, payment_type)
        else {
            return Err(PaymentError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        let rounded = amount.round();
        if !rounded.is_finite() || rounded < 1.0 || rounded > i64::MAX as f64 {
            return Err(PaymentError::Validation(
                "amount must be a positive number of minor currency units".into(),
            ));
        }

        let payment_type = PaymentType::parse(payment_type).ok_or_else(|| {
            PaymentError::Validation(format!(
                "paymentType must be one of initial, final, maintenance (got {payment_type})"
            ))
        })?;

        let currency = present(self.currency.as_ref())
            .map(|c| c.trim().to_lowercase())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let mut metadata: BTreeMap<String, String> = self
            .metadata
            .iter()
            .flatten()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), value)
            })
            .collect();
        metadata.insert("projectId".into(), project_id.to_string());
        metadata.insert("clientId".into(), client_id.to_string());
        metadata.insert("paymentType".into(), payment_type.as_str().to_string());

        #[allow(clippy::cast_possible_truncation)]
        let amount = rounded as i64;

        Ok(ValidIntent {
            amount,
            currency,
            project_id: project_id.to_string(),
            client_id: client_id.to_string(),
            payment_type,
            metadata,
        })
    }
}

/// Payment intent creator and confirmer
#[derive(Clone)]
pub struct PaymentService {
    processor: Arc<dyn PaymentProcessor>,
    store: Arc<dyn PaymentStore>,
}

impl PaymentService {
    pub fn new(processor: Arc<dyn PaymentProcessor>, store: Arc<dyn PaymentStore>) -> Self {
        Self { processor, store }
    }

    /// Create a processor intent and its pending payment row
    pub async fn create_intent(
        &self,
        auth: &RequestAuth,
        request: &CreateIntentRequest,
    ) -> Result<CreatedIntent> {
        let valid = request.validate()?;

        let intent = self
            .processor
            .create_intent(&IntentParams {
                amount: valid.amount,
                currency: valid.currency.clone(),
                metadata: valid.metadata,
            })
            .await?;

        let client_secret = intent.client_secret.clone().ok_or_else(|| {
            PaymentError::Processor(format!("Intent {} has no client secret", intent.id))
        })?;

        let payment = self
            .store
            .insert(
                auth,
                &NewPayment::pending(
                    intent.id.clone(),
                    valid.project_id,
                    valid.client_id,
                    valid.amount,
                    valid.currency,
                    valid.payment_type,
                ),
            )
            .await?;

        tracing::info!(
            intent_id = %intent.id,
            payment_id = %payment.id,
            amount = intent.amount,
            currency = %intent.currency,
            payment_type = %valid.payment_type,
            processor = self.processor.name(),
            "Created payment intent"
        );

        Ok(CreatedIntent {
            client_secret,
            payment_intent_id: intent.id,
            amount: intent.amount,
            currency: intent.currency,
            status: intent.status.to_string(),
            payment_id: payment.id,
        })
    }

    /// Check the intent with the processor and settle its row as succeeded
    pub async fn confirm(
        &self,
        auth: &RequestAuth,
        request: &ConfirmRequest,
    ) -> Result<ConfirmedPayment> {
        let intent_id = present(request.payment_intent_id.as_ref())
            .ok_or_else(|| PaymentError::Validation("Missing paymentIntentId".into()))?;

        let intent = self.processor.retrieve_intent(intent_id).await?;
        if intent.status != IntentStatus::Succeeded {
            return Err(PaymentError::NotSucceeded(intent.status.to_string()));
        }

        let payment = self
            .settle(
                auth,
                intent_id,
                &Settlement::new(PaymentStatus::Succeeded, intent.payment_method()),
            )
            .await?;

        Ok(payment.into())
    }

    /// Move a pending row to a terminal status.
    ///
    /// A row already in the requested status is returned unchanged; any other
    /// terminal status is an invalid transition.
    pub async fn settle(
        &self,
        auth: &RequestAuth,
        intent_id: &str,
        settlement: &Settlement,
    ) -> Result<Payment> {
        if let Some(payment) = self.store.settle_pending(auth, intent_id, settlement).await? {
            tracing::info!(
                intent_id = %intent_id,
                payment_id = %payment.id,
                status = %payment.status,
                "Settled payment"
            );
            return Ok(payment);
        }

        match self.store.find_by_intent(auth, intent_id).await? {
            None => Err(PaymentError::PaymentNotFound(intent_id.to_string())),
            Some(payment) if payment.status == settlement.status => {
                tracing::debug!(
                    intent_id = %intent_id,
                    status = %payment.status,
                    "Payment already settled"
                );
                Ok(payment)
            }
            Some(payment) => Err(PaymentError::InvalidTransition {
                intent_id: intent_id.to_string(),
                from: payment.status,
                to: settlement.status,
            }),
        }
    }

    /// Apply a verified webhook event.
    ///
    /// Declined attempts leave the row pending. Unknown intents and
    /// conflicting transitions are logged and skipped.
    pub async fn apply_webhook(&self, event: &WebhookEvent) -> Result<Option<Payment>> {
        let Some((intent_id, status)) = event.settlement() else {
            if let WebhookEvent::IntentFailed { intent_id } = event {
                tracing::info!(intent_id = %intent_id, "Payment attempt declined, row stays pending");
            } else {
                tracing::debug!(event = ?event, "Ignoring webhook event");
            }
            return Ok(None);
        };

        let settlement = Settlement::new(status, event.payment_method());
        match self
            .settle(&RequestAuth::service(), intent_id, &settlement)
            .await
        {
            Ok(payment) => Ok(Some(payment)),
            Err(e @ (PaymentError::PaymentNotFound(_) | PaymentError::InvalidTransition { .. })) => {
                tracing::warn!(intent_id = %intent_id, error = %e, "Skipping webhook settlement");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
