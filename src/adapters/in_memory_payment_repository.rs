//! In-process implementation of PaymentRepository for tests and local runs
//! without a database.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::payment::DEFAULT_PROVIDER;
use crate::domain::{EventKind, PaymentEvent, PaymentRecord, PaymentStatus};
use crate::ports::{PaymentRepository, RepositoryError, RepositoryResult};

#[derive(Default)]
struct Store {
    next_id: i64,
    payments: HashMap<String, PaymentRecord>,
    events: Vec<PaymentEvent>,
}

#[derive(Clone, Default)]
pub struct InMemoryPaymentRepository {
    store: Arc<RwLock<Store>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every operation fails like an unreachable database.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Overwrites the creation time of a record.
    pub async fn backdate(&self, reference: &str, created_at: DateTime<Utc>) -> bool {
        let mut store = self.store.write().await;
        match store.payments.get_mut(reference) {
            Some(record) => {
                record.created_at = created_at;
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.payments.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_online(&self) -> RepositoryResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn exists(&self, reference: &str) -> RepositoryResult<bool> {
        self.check_online()?;
        Ok(self.store.read().await.payments.contains_key(reference))
    }

    async fn create(
        &self,
        reference: &str,
        phone_number: &str,
        amount: &BigDecimal,
    ) -> RepositoryResult<i64> {
        self.check_online()?;
        let mut store = self.store.write().await;
        if store.payments.contains_key(reference) {
            return Err(RepositoryError::Conflict(reference.to_string()));
        }

        store.next_id += 1;
        let now = Utc::now();
        let record = PaymentRecord {
            id: store.next_id,
            transaction_reference: reference.to_string(),
            phone_number: phone_number.to_string(),
            amount: amount.clone(),
            status: PaymentStatus::Pending,
            provider: DEFAULT_PROVIDER.to_string(),
            created_at: now,
            updated_at: now,
        };
        let id = record.id;
        store.payments.insert(reference.to_string(), record);

        Ok(id)
    }

    async fn update_status(
        &self,
        reference: &str,
        status: PaymentStatus,
    ) -> RepositoryResult<bool> {
        self.check_online()?;
        let mut store = self.store.write().await;
        match store.payments.get_mut(reference) {
            Some(record) => {
                record.status = status;
                record.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn resolve_pending(
        &self,
        reference: &str,
        status: PaymentStatus,
    ) -> RepositoryResult<bool> {
        self.check_online()?;
        let mut store = self.store.write().await;
        match store.payments.get_mut(reference) {
            Some(record) if record.status == PaymentStatus::Pending => {
                record.status = status;
                record.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_by_reference(&self, reference: &str) -> RepositoryResult<Option<PaymentRecord>> {
        self.check_online()?;
        Ok(self.store.read().await.payments.get(reference).cloned())
    }

    async fn expire_stale_pending(&self, cutoff: DateTime<Utc>) -> RepositoryResult<Vec<String>> {
        self.check_online()?;
        let mut store = self.store.write().await;
        let now = Utc::now();
        let mut expired = Vec::new();

        for record in store.payments.values_mut() {
            if record.status == PaymentStatus::Pending && record.created_at < cutoff {
                record.status = PaymentStatus::Failed;
                record.updated_at = now;
                expired.push(record.transaction_reference.clone());
            }
        }

        expired.sort();
        Ok(expired)
    }

    async fn record_event(
        &self,
        reference: &str,
        kind: EventKind,
        message: &str,
    ) -> RepositoryResult<()> {
        self.check_online()?;
        let mut store = self.store.write().await;
        let id = store.events.len() as i64 + 1;
        store.events.push(PaymentEvent {
            id,
            transaction_reference: reference.to_string(),
            event_type: kind.as_str().to_string(),
            message: Some(message.to_string()),
            created_at: Utc::now(),
        });

        Ok(())
    }

    async fn list_events(&self, reference: &str) -> RepositoryResult<Vec<PaymentEvent>> {
        self.check_online()?;
        Ok(self
            .store
            .read()
            .await
            .events
            .iter()
            .filter(|event| event.transaction_reference == reference)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        self.check_online()
    }
}
