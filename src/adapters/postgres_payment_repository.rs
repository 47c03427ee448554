//! Postgres implementation of PaymentRepository.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{EventKind, PaymentEvent, PaymentRecord, PaymentStatus};
use crate::ports::{PaymentRepository, RepositoryError, RepositoryResult};

/// Postgres-backed payment repository.
#[derive(Clone)]
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn exists(&self, reference: &str) -> RepositoryResult<bool> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM payments WHERE transaction_reference = $1)",
        )
        .bind(reference)
        .fetch_one(&self.pool)
        .await?;

        Ok(found)
    }

    async fn create(
        &self,
        reference: &str,
        phone_number: &str,
        amount: &BigDecimal,
    ) -> RepositoryResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO payments (transaction_reference, phone_number, amount, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(reference)
        .bind(phone_number)
        .bind(amount)
        .bind(PaymentStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepositoryError::Conflict(reference.to_string())
            }
            other => RepositoryError::from(other),
        })
    }

    async fn update_status(
        &self,
        reference: &str,
        status: PaymentStatus,
    ) -> RepositoryResult<bool> {
        let result = sqlx::query(
            "UPDATE payments SET status = $1, updated_at = NOW() WHERE transaction_reference = $2",
        )
        .bind(status.as_str())
        .bind(reference)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn resolve_pending(
        &self,
        reference: &str,
        status: PaymentStatus,
    ) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET status = $1, updated_at = NOW()
            WHERE transaction_reference = $2 AND status = $3
            "#,
        )
        .bind(status.as_str())
        .bind(reference)
        .bind(PaymentStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_by_reference(&self, reference: &str) -> RepositoryResult<Option<PaymentRecord>> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, transaction_reference, phone_number, amount, status,
                provider, created_at, updated_at
            FROM payments
            WHERE transaction_reference = $1
            "#,
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PaymentRow::into_domain).transpose()
    }

    async fn expire_stale_pending(&self, cutoff: DateTime<Utc>) -> RepositoryResult<Vec<String>> {
        let references = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE payments SET status = $1, updated_at = NOW()
            WHERE status = $2 AND created_at < $3
            RETURNING transaction_reference
            "#,
        )
        .bind(PaymentStatus::Failed.as_str())
        .bind(PaymentStatus::Pending.as_str())
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(references)
    }

    async fn record_event(
        &self,
        reference: &str,
        kind: EventKind,
        message: &str,
    ) -> RepositoryResult<()> {
        sqlx::query(
            "INSERT INTO payment_logs (transaction_reference, event_type, message) VALUES ($1, $2, $3)",
        )
        .bind(reference)
        .bind(kind.as_str())
        .bind(message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_events(&self, reference: &str) -> RepositoryResult<Vec<PaymentEvent>> {
        let rows = sqlx::query_as::<_, PaymentEventRow>(
            r#"
            SELECT id, transaction_reference, event_type, message, created_at
            FROM payment_logs
            WHERE transaction_reference = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(reference)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PaymentEventRow::into_domain).collect())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    transaction_reference: String,
    phone_number: String,
    amount: BigDecimal,
    status: String,
    provider: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_domain(self) -> RepositoryResult<PaymentRecord> {
        let status = self
            .status
            .parse::<PaymentStatus>()
            .map_err(|e| RepositoryError::Corrupt(format!("{}: {}", self.transaction_reference, e)))?;

        Ok(PaymentRecord {
            id: self.id,
            transaction_reference: self.transaction_reference,
            phone_number: self.phone_number,
            amount: self.amount,
            status,
            provider: self.provider,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentEventRow {
    id: i64,
    transaction_reference: String,
    event_type: String,
    message: Option<String>,
    created_at: DateTime<Utc>,
}

impl PaymentEventRow {
    fn into_domain(self) -> PaymentEvent {
        PaymentEvent {
            id: self.id,
            transaction_reference: self.transaction_reference,
            event_type: self.event_type,
            message: self.message,
            created_at: self.created_at,
        }
    }
}
