//! Payment Records
//!
//! The `payments` row as stored, plus the status and type enums that
//! constrain it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a stored payment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Canceled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    /// Only `pending` may move, and only to a terminal status.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(self, PaymentStatus::Pending) && next.is_terminal()
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the payment is for in the project timeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Initial,
    Final,
    Maintenance,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Initial => "initial",
            PaymentType::Final => "final",
            PaymentType::Maintenance => "maintenance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "initial" => Some(PaymentType::Initial),
            "final" => Some(PaymentType::Final),
            "maintenance" => Some(PaymentType::Maintenance),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored payment row
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Store-assigned identifier
    pub id: String,

    pub project_id: String,

    pub client_id: String,

    /// Stripe PaymentIntent id; unique across rows
    pub stripe_payment_intent_id: String,

    /// Minor currency units
    pub amount: i64,

    pub currency: String,

    pub status: PaymentStatus,

    #[serde(default)]
    pub payment_method: Option<String>,

    pub payment_type: PaymentType,

    pub created_at: DateTime<Utc>,

    /// Set when the status leaves `pending`
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
}

/// Row to insert when an intent is created
#[derive(Clone, Debug, Serialize)]
pub struct NewPayment {
    pub project_id: String,
    pub client_id: String,
    pub stripe_payment_intent_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_type: PaymentType,
}

impl NewPayment {
    pub fn pending(
        intent_id: impl Into<String>,
        project_id: impl Into<String>,
        client_id: impl Into<String>,
        amount: i64,
        currency: impl Into<String>,
        payment_type: PaymentType,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            client_id: client_id.into(),
            stripe_payment_intent_id: intent_id.into(),
            amount,
            currency: currency.into(),
            status: PaymentStatus::Pending,
            payment_type,
        }
    }
}

/// Terminal update applied to a pending row
#[derive(Clone, Debug, Serialize)]
pub struct Settlement {
    pub status: PaymentStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,

    pub processed_at: DateTime<Utc>,
}

impl Settlement {
    pub fn new(status: PaymentStatus, payment_method: Option<String>) -> Self {
        Self {
            status,
            payment_method,
            processed_at: Utc::now(),
        }
    }
}
