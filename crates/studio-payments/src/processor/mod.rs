//! Payment Processor Integration
//!
//! The seam between the payment service and the card processor. Stripe is
//! the production implementation; `MockProcessor` backs tests and local demos.

mod mock;
mod stripe_api;

pub use mock::MockProcessor;
pub use stripe_api::StripeProcessor;

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::Result;

/// Processor-side status of an intent
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    /// Status string this build does not know about
    Other(String),
}

impl IntentStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "requires_payment_method" => IntentStatus::RequiresPaymentMethod,
            "requires_confirmation" => IntentStatus::RequiresConfirmation,
            "requires_action" => IntentStatus::RequiresAction,
            "processing" => IntentStatus::Processing,
            "requires_capture" => IntentStatus::RequiresCapture,
            "canceled" => IntentStatus::Canceled,
            "succeeded" => IntentStatus::Succeeded,
            other => IntentStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            IntentStatus::RequiresPaymentMethod => "requires_payment_method",
            IntentStatus::RequiresConfirmation => "requires_confirmation",
            IntentStatus::RequiresAction => "requires_action",
            IntentStatus::Processing => "processing",
            IntentStatus::RequiresCapture => "requires_capture",
            IntentStatus::Canceled => "canceled",
            IntentStatus::Succeeded => "succeeded",
            IntentStatus::Other(s) => s,
        }
    }
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for creating an intent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntentParams {
    /// Minor currency units
    pub amount: i64,

    /// Lowercase ISO currency code
    pub currency: String,

    /// Tags attached to the intent
    pub metadata: BTreeMap<String, String>,
}

/// An intent as reported by the processor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessorIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: IntentStatus,
    pub amount: i64,
    pub currency: String,
    pub payment_method_types: Vec<String>,
}

impl ProcessorIntent {
    /// Label stored on the payment row once the intent settles
    pub fn payment_method(&self) -> Option<String> {
        self.payment_method_types.first().cloned()
    }
}

/// Payment processor trait
///
/// Implement this for each processor. Automatic payment methods are always
/// requested on create.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a new intent
    async fn create_intent(&self, params: &IntentParams) -> Result<ProcessorIntent>;

    /// Fetch the current state of an intent
    async fn retrieve_intent(&self, intent_id: &str) -> Result<ProcessorIntent>;

    /// Processor name, for logs
    fn name(&self) -> &str;
}
