//! Stripe Webhook Handling
//!
//! Verifies `Stripe-Signature` headers and turns payment intent events into
//! settlements, so payments that complete without a client confirmation call
//! still reach a terminal status.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::{PaymentError, Result};
use crate::model::PaymentStatus;

type HmacSha256 = Hmac<Sha256>;

/// Stripe's default replay window
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Parsed webhook event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Intent succeeded - settle the row as succeeded
    IntentSucceeded {
        intent_id: String,
        payment_method: Option<String>,
    },

    /// One payment attempt was declined. The intent returns to
    /// `requires_payment_method` and may still succeed, so the row stays put.
    IntentFailed { intent_id: String },

    /// Intent canceled
    IntentCanceled { intent_id: String },

    /// Unhandled event type
    Other { event_type: String },
}

impl WebhookEvent {
    /// Intent id and the terminal status this event implies
    pub fn settlement(&self) -> Option<(&str, PaymentStatus)> {
        match self {
            WebhookEvent::IntentSucceeded { intent_id, .. } => {
                Some((intent_id, PaymentStatus::Succeeded))
            }
            WebhookEvent::IntentCanceled { intent_id } => {
                Some((intent_id, PaymentStatus::Canceled))
            }
            WebhookEvent::IntentFailed { .. } | WebhookEvent::Other { .. } => None,
        }
    }

    pub fn payment_method(&self) -> Option<String> {
        match self {
            WebhookEvent::IntentSucceeded { payment_method, .. } => payment_method.clone(),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Deserialize)]
struct RawEventData {
    object: RawIntent,
}

#[derive(Deserialize)]
struct RawIntent {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    payment_method_types: Vec<String>,
}

/// Signature verifier bound to one endpoint secret
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Verify webhook signature and parse event
    pub fn construct_event(&self, payload: &str, signature: &str) -> Result<WebhookEvent> {
        self.verify(payload, signature, chrono::Utc::now().timestamp())?;
        parse_event(payload)
    }

    /// Build a `Stripe-Signature` header for a payload, as Stripe would send it
    pub fn signature_header(&self, payload: &str, timestamp: i64) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| PaymentError::WebhookSignature(e.to_string()))?;
        mac.update(format!("{timestamp}.{payload}").as_bytes());
        Ok(format!(
            "t={timestamp},v1={}",
            hex::encode(mac.finalize().into_bytes())
        ))
    }

    /// Check a `t=...,v1=...` header against the payload at time `now`
    pub fn verify(&self, payload: &str, signature: &str, now: i64) -> Result<()> {
        let mut timestamp = None;
        let mut candidates = Vec::new();

        for part in signature.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
                Some(("v1", value)) => candidates.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| PaymentError::WebhookSignature("missing timestamp".into()))?;
        if candidates.is_empty() {
            return Err(PaymentError::WebhookSignature("missing v1 signature".into()));
        }
        if (now - timestamp).abs() > self.tolerance_secs {
            return Err(PaymentError::WebhookSignature(
                "timestamp outside the tolerance zone".into(),
            ));
        }

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| PaymentError::WebhookSignature(e.to_string()))?;
        mac.update(format!("{timestamp}.{payload}").as_bytes());

        let matched = candidates.iter().any(|candidate| {
            hex::decode(candidate)
                .map(|expected| mac.clone().verify_slice(&expected).is_ok())
                .unwrap_or(false)
        });

        if matched {
            Ok(())
        } else {
            Err(PaymentError::WebhookSignature(
                "no signatures found matching the expected signature".into(),
            ))
        }
    }
}

/// Parse a Stripe event body into our event type
pub fn parse_event(payload: &str) -> Result<WebhookEvent> {
    let raw: RawEvent =
        serde_json::from_str(payload).map_err(|e| PaymentError::WebhookParse(e.to_string()))?;

    let intent_id = || {
        raw.data
            .object
            .id
            .clone()
            .ok_or_else(|| PaymentError::WebhookParse("event object has no id".into()))
    };

    match raw.event_type.as_str() {
        "payment_intent.succeeded" => Ok(WebhookEvent::IntentSucceeded {
            intent_id: intent_id()?,
            payment_method: raw.data.object.payment_method_types.first().cloned(),
        }),
        "payment_intent.payment_failed" => Ok(WebhookEvent::IntentFailed {
            intent_id: intent_id()?,
        }),
        "payment_intent.canceled" => Ok(WebhookEvent::IntentCanceled {
            intent_id: intent_id()?,
        }),
        other => Ok(WebhookEvent::Other {
            event_type: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test123secret456";

    fn sign(payload: &str, secret: &str, timestamp: i64) -> String {
        WebhookVerifier::new(secret)
            .signature_header(payload, timestamp)
            .unwrap()
    }

    fn succeeded_payload() -> String {
        serde_json::json!({
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "data": {
                "object": {
                    "id": "pi_123",
                    "object": "payment_intent",
                    "status": "succeeded",
                    "payment_method_types": ["card"]
                }
            }
        })
        .to_string()
    }

    #[test]
    fn test_valid_signature() {
        let payload = succeeded_payload();
        let now = 1_760_000_000;
        let header = sign(&payload, SECRET, now);

        assert!(WebhookVerifier::new(SECRET).verify(&payload, &header, now).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = succeeded_payload();
        let now = 1_760_000_000;
        let header = sign(&payload, "wrong_secret", now);

        let err = WebhookVerifier::new(SECRET)
            .verify(&payload, &header, now)
            .unwrap_err();
        assert!(matches!(err, PaymentError::WebhookSignature(_)));
    }

    #[test]
    fn test_modified_payload_rejected() {
        let payload = succeeded_payload();
        let now = 1_760_000_000;
        let header = sign(&payload, SECRET, now);
        let tampered = payload.replace("pi_123", "pi_999");

        assert!(WebhookVerifier::new(SECRET).verify(&tampered, &header, now).is_err());
    }

    #[test]
    fn test_old_timestamp_rejected() {
        let payload = succeeded_payload();
        let signed_at = 1_760_000_000;
        let header = sign(&payload, SECRET, signed_at);

        let verifier = WebhookVerifier::new(SECRET);
        assert!(verifier.verify(&payload, &header, signed_at + 600).is_err());
        assert!(verifier.verify(&payload, &header, signed_at + 60).is_ok());

        let strict = WebhookVerifier::new(SECRET).with_tolerance(30);
        assert!(strict.verify(&payload, &header, signed_at + 60).is_err());
    }

    #[test]
    fn test_future_timestamp_rejected() {
        let payload = succeeded_payload();
        let now = 1_760_000_000;
        let verifier = WebhookVerifier::new(SECRET);

        let far_future = sign(&payload, SECRET, now + 3_600);
        assert!(matches!(
            verifier.verify(&payload, &far_future, now),
            Err(PaymentError::WebhookSignature(_))
        ));

        let clock_skew = sign(&payload, SECRET, now + 30);
        assert!(verifier.verify(&payload, &clock_skew, now).is_ok());
    }

    #[test]
    fn test_any_v1_may_match() {
        let payload = succeeded_payload();
        let now = 1_760_000_000;
        let good = sign(&payload, SECRET, now);
        let good_sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t={now},v1=deadbeef,v1={good_sig}");

        assert!(WebhookVerifier::new(SECRET).verify(&payload, &header, now).is_ok());
    }

    #[test]
    fn test_malformed_header() {
        let verifier = WebhookVerifier::new(SECRET);
        assert!(verifier.verify("{}", "garbage", 0).is_err());
        assert!(verifier.verify("{}", "t=123", 123).is_err());
    }

    #[test]
    fn test_parse_succeeded() {
        let event = parse_event(&succeeded_payload()).unwrap();
        assert_eq!(
            event,
            WebhookEvent::IntentSucceeded {
                intent_id: "pi_123".into(),
                payment_method: Some("card".into()),
            }
        );
        assert_eq!(event.settlement(), Some(("pi_123", PaymentStatus::Succeeded)));
    }

    #[test]
    fn test_parse_failed_and_other() {
        let failed = r#"{"type":"payment_intent.payment_failed","data":{"object":{"id":"pi_7"}}}"#;
        let event = parse_event(failed).unwrap();
        assert_eq!(
            event,
            WebhookEvent::IntentFailed {
                intent_id: "pi_7".into()
            }
        );
        assert_eq!(event.settlement(), None);

        let canceled = r#"{"type":"payment_intent.canceled","data":{"object":{"id":"pi_8"}}}"#;
        assert_eq!(
            parse_event(canceled).unwrap().settlement(),
            Some(("pi_8", PaymentStatus::Canceled))
        );

        let other = r#"{"type":"charge.refunded","data":{"object":{"id":"ch_1"}}}"#;
        assert_eq!(
            parse_event(other).unwrap(),
            WebhookEvent::Other {
                event_type: "charge.refunded".into()
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_event("not json"),
            Err(PaymentError::WebhookParse(_))
        ));
    }
}
