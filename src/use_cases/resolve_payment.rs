//! Operator resolution of a pending payment, e.g. after checking the
//! provider's dashboard by hand.

use std::sync::Arc;

use crate::domain::{EventKind, PaymentRecord, PaymentStatus};
use crate::ports::PaymentRepository;
use crate::use_cases::{record_event, PaymentError, MSG_LOOKUP_FAILED, MSG_UPDATE_FAILED};

pub struct ResolvePayment {
    payments: Arc<dyn PaymentRepository>,
}

impl ResolvePayment {
    pub fn new(payments: Arc<dyn PaymentRepository>) -> Self {
        Self { payments }
    }

    /// Moves a `pending` payment to a terminal status. Terminal payments are
    /// never reopened or flipped.
    pub async fn execute(
        &self,
        reference: &str,
        status: PaymentStatus,
    ) -> Result<PaymentRecord, PaymentError> {
        let current = self
            .payments
            .get_by_reference(reference)
            .await
            .map_err(|e| PaymentError::persistence(MSG_LOOKUP_FAILED, e))?
            .ok_or_else(|| PaymentError::NotFound(reference.to_string()))?;

        if current.status.is_terminal() || !status.is_terminal() {
            return Err(PaymentError::InvalidTransition {
                reference: reference.to_string(),
                from: current.status,
                to: status,
            });
        }

        let updated = self
            .payments
            .resolve_pending(reference, status)
            .await
            .map_err(|e| PaymentError::persistence(MSG_UPDATE_FAILED, e))?;
        if !updated {
            // Settled by a callback or the sweep between the read and the write.
            let settled = self
                .payments
                .get_by_reference(reference)
                .await
                .map_err(|e| PaymentError::persistence(MSG_LOOKUP_FAILED, e))?
                .ok_or_else(|| PaymentError::NotFound(reference.to_string()))?;
            return Err(PaymentError::InvalidTransition {
                reference: reference.to_string(),
                from: settled.status,
                to: status,
            });
        }

        record_event(
            self.payments.as_ref(),
            reference,
            EventKind::ManualResolution,
            &format!("{} -> {}", current.status, status),
        )
        .await;

        Ok(PaymentRecord { status, ..current })
    }
}
