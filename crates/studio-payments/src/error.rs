//! Payment Error Types

use thiserror::Error;

use crate::model::PaymentStatus;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Missing or malformed request field
    #[error("{0}")]
    Validation(String),

    /// Processor API call failed
    #[error("Payment processor error: {0}")]
    Processor(String),

    /// Intent exists but has not reached `succeeded`
    #[error("Payment not succeeded. Status: {0}")]
    NotSucceeded(String),

    /// Store request failed or returned an unexpected shape
    #[error("Storage error: {0}")]
    Storage(String),

    /// No payment row for the given intent
    #[error("Payment not found for intent {0}")]
    PaymentNotFound(String),

    /// Row is already terminal in a different status
    #[error("Payment for intent {intent_id} is {from}, cannot become {to}")]
    InvalidTransition {
        intent_id: String,
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// No webhook secret configured
    #[error("Webhooks are not configured")]
    WebhooksDisabled,
}

impl PaymentError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::Validation(_) => "VALIDATION_ERROR",
            PaymentError::Processor(_) => "PROCESSOR_ERROR",
            PaymentError::NotSucceeded(_) => "PROCESSING_ERROR",
            PaymentError::Storage(_)
            | PaymentError::PaymentNotFound(_)
            | PaymentError::InvalidTransition { .. } => "STORAGE_ERROR",
            PaymentError::WebhookSignature(_) => "INVALID_SIGNATURE",
            PaymentError::WebhookParse(_) => "INVALID_WEBHOOK",
            PaymentError::WebhooksDisabled => "WEBHOOKS_DISABLED",
        }
    }

    /// True for the storage family (row lookup, row count, transition)
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            PaymentError::Storage(_)
                | PaymentError::PaymentNotFound(_)
                | PaymentError::InvalidTransition { .. }
        )
    }
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        PaymentError::Storage(err.to_string())
    }
}

#[cfg(feature = "axum-handlers")]
mod response {
    use axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    use serde_json::json;

    use super::PaymentError;

    impl PaymentError {
        /// Request failures all surface as 400; a disabled webhook is 503.
        pub fn status_code(&self) -> StatusCode {
            match self {
                PaymentError::WebhooksDisabled => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_REQUEST,
            }
        }
    }

    impl IntoResponse for PaymentError {
        fn into_response(self) -> Response {
            let status = self.status_code();
            let body = Json(json!({
                "error": self.to_string(),
                "code": self.code(),
            }));

            (status, body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_family() {
        assert!(PaymentError::PaymentNotFound("pi_1".into()).is_storage());
        assert!(
            PaymentError::InvalidTransition {
                intent_id: "pi_1".into(),
                from: PaymentStatus::Failed,
                to: PaymentStatus::Succeeded,
            }
            .is_storage()
        );
        assert!(!PaymentError::Validation("x".into()).is_storage());
    }

    #[test]
    fn test_not_succeeded_message() {
        let err = PaymentError::NotSucceeded("requires_action".into());
        assert_eq!(err.to_string(), "Payment not succeeded. Status: requires_action");
        assert_eq!(err.code(), "PROCESSING_ERROR");
    }

    #[test]
    fn test_transition_message() {
        let err = PaymentError::InvalidTransition {
            intent_id: "pi_9".into(),
            from: PaymentStatus::Canceled,
            to: PaymentStatus::Succeeded,
        };
        assert_eq!(
            err.to_string(),
            "Payment for intent pi_9 is canceled, cannot become succeeded"
        );
    }

    #[cfg(feature = "axum-handlers")]
    #[test]
    fn test_status_codes() {
        use axum::http::StatusCode;

        assert_eq!(
            PaymentError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PaymentError::Storage("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PaymentError::WebhooksDisabled.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
