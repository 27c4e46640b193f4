//! Mock Payment Processor
//!
//! For testing and demo purposes. Keeps intents in memory and lets callers
//! move them between statuses the way a browser checkout would.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

use super::{IntentParams, IntentStatus, PaymentProcessor, ProcessorIntent};
use crate::error::{PaymentError, Result};

/// In-memory processor with scripted intents
pub struct MockProcessor {
    intents: Mutex<HashMap<String, ProcessorIntent>>,
    metadata: Mutex<HashMap<String, BTreeMap<String, String>>>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl Default for MockProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProcessor {
    pub fn new() -> Self {
        Self {
            intents: Mutex::new(HashMap::new()),
            metadata: Mutex::new(HashMap::new()),
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails with the given message
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Force an intent into a status, as the browser flow would
    pub async fn set_status(&self, intent_id: &str, status: IntentStatus) -> Result<()> {
        let mut intents = self.intents.lock().await;
        let intent = intents
            .get_mut(intent_id)
            .ok_or_else(|| PaymentError::Processor(format!("No such payment_intent: {intent_id}")))?;
        intent.status = status;
        Ok(())
    }

    /// Metadata the intent was created with
    pub async fn metadata_for(&self, intent_id: &str) -> Option<BTreeMap<String, String>> {
        self.metadata.lock().await.get(intent_id).cloned()
    }

    /// Number of create/retrieve calls seen
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProcessor for MockProcessor {
    async fn create_intent(&self, params: &IntentParams) -> Result<ProcessorIntent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref message) = self.failure {
            return Err(PaymentError::Processor(message.clone()));
        }

        let id = format!("pi_mock_{}", uuid::Uuid::new_v4().simple());
        let intent = ProcessorIntent {
            client_secret: Some(format!("{id}_secret_{}", uuid::Uuid::new_v4().simple())),
            id: id.clone(),
            status: IntentStatus::RequiresPaymentMethod,
            amount: params.amount,
            currency: params.currency.clone(),
            payment_method_types: vec!["card".into()],
        };

        self.intents.lock().await.insert(id.clone(), intent.clone());
        self.metadata.lock().await.insert(id, params.metadata.clone());

        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<ProcessorIntent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref message) = self.failure {
            return Err(PaymentError::Processor(message.clone()));
        }

        self.intents
            .lock()
            .await
            .get(intent_id)
            .cloned()
            .ok_or_else(|| PaymentError::Processor(format!("No such payment_intent: {intent_id}")))
    }

    fn name(&self) -> &str {
        "MockProcessor"
    }
}
