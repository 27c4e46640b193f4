//! Supabase (PostgREST) Store
//!
//! Talks to `{url}/rest/v1/payments`. The store key always goes out as
//! `apikey`; the bearer token is the caller's forwarded `Authorization`
//! header when present, otherwise the store key itself.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, header::AUTHORIZATION};
use std::time::Duration;

use super::{PaymentStore, RequestAuth};
use crate::error::{PaymentError, Result};
use crate::model::{NewPayment, Payment, Settlement};

const PAYMENTS_TABLE: &str = "payments";

/// Supabase connection settings
#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,

    /// Anon or service key sent as `apikey`
    pub api_key: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            timeout_secs: 30,
        }
    }
}

/// PostgREST-backed payment store
#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    config: SupabaseConfig,
}

impl SupabaseStore {
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PaymentError::Storage(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.url.trim_end_matches('/'),
            PAYMENTS_TABLE
        )
    }

    fn request(&self, method: Method, auth: &RequestAuth) -> RequestBuilder {
        let bearer = auth
            .authorization
            .clone()
            .unwrap_or_else(|| format!("Bearer {}", self.config.api_key));

        self.client
            .request(method, self.table_url())
            .header("apikey", &self.config.api_key)
            .header(AUTHORIZATION, bearer)
    }

    async fn rows(response: Response) -> Result<Vec<Payment>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Storage(format!("{status}: {body}")));
        }

        response
            .json::<Vec<Payment>>()
            .await
            .map_err(|e| PaymentError::Storage(format!("Unexpected row shape: {e}")))
    }

    /// At most one row may match an intent id
    fn at_most_one(mut rows: Vec<Payment>, intent_id: &str) -> Result<Option<Payment>> {
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => Err(PaymentError::Storage(format!(
                "{n} payments share intent {intent_id}"
            ))),
        }
    }
}

#[async_trait]
impl PaymentStore for SupabaseStore {
    async fn insert(&self, auth: &RequestAuth, payment: &NewPayment) -> Result<Payment> {
        let response = self
            .request(Method::POST, auth)
            .header("Prefer", "return=representation")
            .json(payment)
            .send()
            .await?;

        let mut rows = Self::rows(response).await?;
        if rows.len() != 1 {
            return Err(PaymentError::Storage(format!(
                "Insert returned {} rows, expected 1",
                rows.len()
            )));
        }

        rows.pop()
            .ok_or_else(|| PaymentError::Storage("Insert returned no rows".into()))
    }

    async fn find_by_intent(&self, auth: &RequestAuth, intent_id: &str) -> Result<Option<Payment>> {
        let response = self
            .request(Method::GET, auth)
            .query(&[
                ("stripe_payment_intent_id", format!("eq.{intent_id}")),
                ("select", "*".to_string()),
            ])
            .send()
            .await?;

        Self::at_most_one(Self::rows(response).await?, intent_id)
    }

    async fn settle_pending(
        &self,
        auth: &RequestAuth,
        intent_id: &str,
        settlement: &Settlement,
    ) -> Result<Option<Payment>> {
        let response = self
            .request(Method::PATCH, auth)
            .query(&[
                ("stripe_payment_intent_id", format!("eq.{intent_id}")),
                ("status", "eq.pending".to_string()),
            ])
            .header("Prefer", "return=representation")
            .json(settlement)
            .send()
            .await?;

        Self::at_most_one(Self::rows(response).await?, intent_id)
    }
}
