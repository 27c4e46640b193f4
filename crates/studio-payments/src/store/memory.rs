use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{PaymentStore, RequestAuth};
use crate::error::{PaymentError, Result};
use crate::model::{NewPayment, Payment, PaymentStatus, Settlement};

/// In-memory payment store (for development and tests)
pub struct MemoryPaymentStore {
    /// Keyed by processor intent id
    payments: RwLock<HashMap<String, Payment>>,
}

impl Default for MemoryPaymentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPaymentStore {
    pub fn new() -> Self {
        Self {
            payments: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.payments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.payments.read().await.is_empty()
    }

    pub async fn all(&self) -> Vec<Payment> {
        self.payments.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl PaymentStore for MemoryPaymentStore {
    async fn insert(&self, _auth: &RequestAuth, payment: &NewPayment) -> Result<Payment> {
        let mut payments = self.payments.write().await;

        if payments.contains_key(&payment.stripe_payment_intent_id) {
            return Err(PaymentError::Storage(format!(
                "duplicate key value violates unique constraint on stripe_payment_intent_id ({})",
                payment.stripe_payment_intent_id
            )));
        }

        let row = Payment {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: payment.project_id.clone(),
            client_id: payment.client_id.clone(),
            stripe_payment_intent_id: payment.stripe_payment_intent_id.clone(),
            amount: payment.amount,
            currency: payment.currency.clone(),
            status: payment.status,
            payment_method: None,
            payment_type: payment.payment_type,
            created_at: Utc::now(),
            processed_at: None,
        };

        payments.insert(row.stripe_payment_intent_id.clone(), row.clone());
        Ok(row)
    }

    async fn find_by_intent(&self, _auth: &RequestAuth, intent_id: &str) -> Result<Option<Payment>> {
        Ok(self.payments.read().await.get(intent_id).cloned())
    }

    async fn settle_pending(
        &self,
        _auth: &RequestAuth,
        intent_id: &str,
        settlement: &Settlement,
    ) -> Result<Option<Payment>> {
        let mut payments = self.payments.write().await;

        match payments.get_mut(intent_id) {
            Some(row) if row.status == PaymentStatus::Pending => {
                row.status = settlement.status;
                row.processed_at = Some(settlement.processed_at);
                if settlement.payment_method.is_some() {
                    row.payment_method = settlement.payment_method.clone();
                }
                Ok(Some(row.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaymentType;

    fn new_payment(intent_id: &str) -> NewPayment {
        NewPayment::pending(intent_id, "p1", "c1", 29900, "cad", PaymentType::Initial)
    }

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let store = MemoryPaymentStore::new();
        let row = store
            .insert(&RequestAuth::service(), &new_payment("pi_1"))
            .await
            .unwrap();

        assert!(!row.id.is_empty());
        assert_eq!(row.status, PaymentStatus::Pending);
        assert!(row.processed_at.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_intent_rejected() {
        let store = MemoryPaymentStore::new();
        let auth = RequestAuth::service();
        store.insert(&auth, &new_payment("pi_1")).await.unwrap();

        let err = store.insert(&auth, &new_payment("pi_1")).await.unwrap_err();
        assert!(matches!(err, PaymentError::Storage(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_settle_only_from_pending() {
        let store = MemoryPaymentStore::new();
        let auth = RequestAuth::service();
        store.insert(&auth, &new_payment("pi_1")).await.unwrap();

        let settled = store
            .settle_pending(
                &auth,
                "pi_1",
                &Settlement::new(PaymentStatus::Succeeded, Some("card".into())),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(settled.status, PaymentStatus::Succeeded);
        assert_eq!(settled.payment_method.as_deref(), Some("card"));
        assert!(settled.processed_at.is_some());

        let again = store
            .settle_pending(&auth, "pi_1", &Settlement::new(PaymentStatus::Failed, None))
            .await
            .unwrap();
        assert!(again.is_none());

        let row = store.find_by_intent(&auth, "pi_1").await.unwrap().unwrap();
        assert_eq!(row.status, PaymentStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_settle_unknown_intent() {
        let store = MemoryPaymentStore::new();
        let result = store
            .settle_pending(
                &RequestAuth::service(),
                "pi_none",
                &Settlement::new(PaymentStatus::Succeeded, None),
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
