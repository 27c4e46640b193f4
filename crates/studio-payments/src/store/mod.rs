//! Payment Storage
//!
//! Persistence for `payments` rows. The hosted table sits behind a PostgREST
//! API (`SupabaseStore`); `MemoryPaymentStore` serves tests and development.

mod memory;
mod supabase;

pub use memory::MemoryPaymentStore;
pub use supabase::{SupabaseConfig, SupabaseStore};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{NewPayment, Payment, Settlement};

/// Credentials of the caller a store request is made on behalf of
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestAuth {
    /// Raw `Authorization` header forwarded from the incoming request
    pub authorization: Option<String>,
}

impl RequestAuth {
    /// No caller credentials; the store's own key is used
    pub fn service() -> Self {
        Self::default()
    }

    pub fn forwarded(header: impl Into<String>) -> Self {
        Self {
            authorization: Some(header.into()),
        }
    }
}

/// Payment storage trait
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Insert a new row and return it as stored
    async fn insert(&self, auth: &RequestAuth, payment: &NewPayment) -> Result<Payment>;

    /// Look up the row for a processor intent
    async fn find_by_intent(&self, auth: &RequestAuth, intent_id: &str) -> Result<Option<Payment>>;

    /// Apply a settlement only if the row is still `pending`.
    ///
    /// Returns `None` when no pending row matched.
    async fn settle_pending(
        &self,
        auth: &RequestAuth,
        intent_id: &str,
        settlement: &Settlement,
    ) -> Result<Option<Payment>>;
}
