//! # studio-payments
//!
//! Payment intent lifecycle for the studio platform.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────┐ create  ┌──────────────┐ intent  ┌────────┐
//! │ Client   │────────▶│ PaymentSvc   │────────▶│ Stripe │
//! │ (browser)│◀────────│              │         └────────┘
//! └──────────┘ secret  │              │ pending ┌──────────┐
//!      │               │              │────────▶│ payments │
//!      │ confirm       │              │ settle  │ (store)  │
//!      └──────────────▶│              │────────▶│          │
//!                      └──────────────┘         └──────────┘
//! ```
//!
//! The processor and the store sit behind traits (`PaymentProcessor`,
//! `PaymentStore`) so the service can run against Stripe and Supabase in
//! production and against in-memory doubles in tests.
//!
//! Rows only ever leave `pending`: the store's settle operation is
//! conditional on the current status, so repeated or concurrent confirmations
//! converge on one terminal write.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use studio_payments::{
//!     CreateIntentRequest, PaymentService, RequestAuth, StripeProcessor, SupabaseConfig,
//!     SupabaseStore,
//! };
//!
//! let service = PaymentService::new(
//!     Arc::new(StripeProcessor::new("sk_test_xxx")),
//!     Arc::new(SupabaseStore::new(SupabaseConfig::new("https://xyz.supabase.co", "anon"))?),
//! );
//!
//! let created = service.create_intent(&RequestAuth::service(), &request).await?;
//! // Hand created.client_secret to Stripe Elements in the browser.
//! ```

mod error;
mod model;
mod service;

pub mod processor;
pub mod store;
pub mod webhook;

pub use error::{PaymentError, Result};
pub use model::{NewPayment, Payment, PaymentStatus, PaymentType, Settlement};
pub use processor::{IntentStatus, MockProcessor, PaymentProcessor, StripeProcessor};
pub use service::{
    ConfirmRequest, ConfirmedPayment, CreateIntentRequest, CreatedIntent, DEFAULT_CURRENCY,
    PaymentService,
};
pub use store::{MemoryPaymentStore, PaymentStore, RequestAuth, SupabaseConfig, SupabaseStore};
pub use webhook::{WebhookEvent, WebhookVerifier};
