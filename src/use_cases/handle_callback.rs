//! Provider callback use case.
//! Verifies the notified reference with the provider and resolves the
//! payment. The provider always gets an acknowledgement once a reference is
//! present; store problems are only logged so the provider never retries
//! indefinitely.

use std::sync::Arc;

use crate::domain::{EventKind, PaymentStatus};
use crate::ports::{MobileMoneyProvider, PaymentRepository};
use crate::use_cases::{record_event, PaymentError};
use crate::validation::{self, ValidationError};

pub const MSG_MISSING_REFERENCE: &str = "Missing transaction reference";
pub const MSG_CONFIRMED: &str = "Payment confirmed successfully";
pub const MSG_VERIFICATION_FAILED: &str = "Payment verification failed";
pub const MSG_VERIFICATION_PENDING: &str = "Callback received; verification pending";

#[derive(Debug, Clone, PartialEq)]
pub struct CallbackOutcome {
    pub transaction_reference: String,
    pub message: &'static str,
    /// Status the callback tried to set, if verification completed.
    pub status: Option<PaymentStatus>,
    /// Whether a stored record was actually changed.
    pub updated: bool,
}

pub struct HandleCallback {
    payments: Arc<dyn PaymentRepository>,
    provider: Arc<dyn MobileMoneyProvider>,
}

impl HandleCallback {
    pub fn new(payments: Arc<dyn PaymentRepository>, provider: Arc<dyn MobileMoneyProvider>) -> Self {
        Self { payments, provider }
    }

    pub async fn execute(&self, reference: &str) -> Result<CallbackOutcome, PaymentError> {
        let reference = reference.trim();
        if validation::is_missing(reference) {
            return Err(ValidationError::new("transaction_reference", MSG_MISSING_REFERENCE).into());
        }

        let verification = match self.provider.verify_payment(reference).await {
            Ok(verification) => verification,
            Err(e) => {
                tracing::warn!(reference = %reference, error = %e, "Callback verification unavailable");
                return Ok(CallbackOutcome {
                    transaction_reference: reference.to_string(),
                    message: MSG_VERIFICATION_PENDING,
                    status: None,
                    updated: false,
                });
            }
        };

        let (status, kind, message) = if verification.verified {
            (PaymentStatus::Successful, EventKind::CallbackVerified, MSG_CONFIRMED)
        } else {
            (PaymentStatus::Failed, EventKind::CallbackRejected, MSG_VERIFICATION_FAILED)
        };

        let updated = match self.payments.resolve_pending(reference, status).await {
            Ok(true) => {
                tracing::info!(reference = %reference, status = %status, "Payment resolved by callback");
                true
            }
            Ok(false) => {
                self.log_unapplied(reference, status).await;
                false
            }
            Err(e) => {
                tracing::error!(reference = %reference, error = %e, "Failed to update payment status");
                false
            }
        };

        if updated {
            record_event(self.payments.as_ref(), reference, kind, message).await;
        }

        Ok(CallbackOutcome {
            transaction_reference: reference.to_string(),
            message,
            status: Some(status),
            updated,
        })
    }

    /// Explains why a verified callback changed nothing. Terminal records
    /// keep their first status.
    async fn log_unapplied(&self, reference: &str, status: PaymentStatus) {
        match self.payments.get_by_reference(reference).await {
            Ok(None) => {
                tracing::warn!(reference = %reference, "Callback for unknown payment acknowledged");
            }
            Ok(Some(record)) if record.status == status => {
                tracing::info!(reference = %reference, status = %status, "Duplicate callback acknowledged");
            }
            Ok(Some(record)) => {
                tracing::warn!(
                    reference = %reference,
                    current = %record.status,
                    requested = %status,
                    "Callback conflicts with settled payment; status kept"
                );
            }
            Err(e) => {
                tracing::error!(reference = %reference, error = %e, "Failed to look up payment");
            }
        }
    }
}
