//! Seams between the payment workflows and the outside world: the record
//! store and the mobile-money provider.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{EventKind, PaymentEvent, PaymentRecord, PaymentStatus};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("transaction reference already exists: {0}")]
    Conflict(String),

    #[error("corrupt payment row: {0}")]
    Corrupt(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Durable store of payment records. Every operation is a single
/// auto-committed statement.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn exists(&self, reference: &str) -> RepositoryResult<bool>;

    /// Inserts a `pending` record and returns its id.
    async fn create(
        &self,
        reference: &str,
        phone_number: &str,
        amount: &BigDecimal,
    ) -> RepositoryResult<i64>;

    /// Returns `false` when no record matches. Transitions are not checked here.
    async fn update_status(&self, reference: &str, status: PaymentStatus)
        -> RepositoryResult<bool>;

    /// Moves a `pending` record to `status`. Returns `false` when the record
    /// is missing or no longer pending.
    async fn resolve_pending(&self, reference: &str, status: PaymentStatus)
        -> RepositoryResult<bool>;

    async fn get_by_reference(&self, reference: &str) -> RepositoryResult<Option<PaymentRecord>>;

    /// Fails every `pending` record created before `cutoff` and returns their references.
    async fn expire_stale_pending(&self, cutoff: DateTime<Utc>) -> RepositoryResult<Vec<String>>;

    async fn record_event(
        &self,
        reference: &str,
        kind: EventKind,
        message: &str,
    ) -> RepositoryResult<()>;

    async fn list_events(&self, reference: &str) -> RepositoryResult<Vec<PaymentEvent>>;

    async fn ping(&self) -> RepositoryResult<()>;
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request timed out")]
    Timeout,

    #[error("provider rejected the request: {0}")]
    Rejected(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("invalid response from provider: {0}")]
    InvalidResponse(String),

    /// The connection failed after the request may have been delivered.
    #[error("provider connection interrupted: {0}")]
    Interrupted(String),
}

impl ProviderError {
    /// A definite failure means the provider will not collect this payment.
    /// Timeouts, interrupted connections and unreadable replies leave the
    /// outcome unknown.
    pub fn is_definite(&self) -> bool {
        matches!(self, ProviderError::Rejected(_) | ProviderError::Unavailable(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRequest {
    pub reference: String,
    pub phone_number: String,
    pub amount: BigDecimal,
}

/// Provider acknowledgement of a collection request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionAck {
    pub transaction_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub verified: bool,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// A mobile-money service able to push a payment prompt and confirm its outcome.
#[async_trait]
pub trait MobileMoneyProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn request_payment(
        &self,
        request: &CollectionRequest,
    ) -> Result<CollectionAck, ProviderError>;

    async fn verify_payment(&self, reference: &str) -> Result<Verification, ProviderError>;

    async fn ping(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
