//! Sweep for payments that never received a callback.

use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::domain::EventKind;
use crate::ports::PaymentRepository;
use crate::use_cases::{record_event, PaymentError, MSG_UPDATE_FAILED};

pub struct ExpireStalePayments {
    payments: Arc<dyn PaymentRepository>,
}

impl ExpireStalePayments {
    pub fn new(payments: Arc<dyn PaymentRepository>) -> Self {
        Self { payments }
    }

    /// Fails every payment still `pending` after `max_age`; returns their references.
    pub async fn execute(&self, max_age: Duration) -> Result<Vec<String>, PaymentError> {
        let cutoff = Utc::now() - max_age;
        let expired = self
            .payments
            .expire_stale_pending(cutoff)
            .await
            .map_err(|e| PaymentError::persistence(MSG_UPDATE_FAILED, e))?;

        let message = format!("no confirmation within {} minutes", max_age.num_minutes());
        for reference in &expired {
            record_event(self.payments.as_ref(), reference, EventKind::Expired, &message).await;
        }

        tracing::info!(count = expired.len(), cutoff = %cutoff, "Expired stale pending payments");
        Ok(expired)
    }
}
