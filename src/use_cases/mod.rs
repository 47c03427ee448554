//! Payment workflows. Each use case owns its collaborators behind the
//! `ports` traits and reports failures as [`PaymentError`].

pub mod expire_stale;
pub mod handle_callback;
pub mod initiate_payment;
pub mod payment_status;
pub mod resolve_payment;

pub use expire_stale::ExpireStalePayments;
pub use handle_callback::{CallbackOutcome, HandleCallback};
pub use initiate_payment::{InitiateInput, InitiateOutput, InitiatePayment};
pub use payment_status::PaymentStatusQuery;
pub use resolve_payment::ResolvePayment;

use thiserror::Error;

use crate::domain::{EventKind, PaymentStatus};
use crate::ports::{PaymentRepository, RepositoryError};
use crate::validation::ValidationError;

pub const MSG_CREATE_FAILED: &str = "Failed to create payment record";
pub const MSG_LOOKUP_FAILED: &str = "Failed to retrieve payment";
pub const MSG_UPDATE_FAILED: &str = "Failed to update payment status";
pub const MSG_PROVIDER_FAILED: &str = "Failed to initiate payment request";

/// Failures surfaced by the payment workflows. `Display` is the message shown
/// to the caller; store details are logged, never displayed.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Transaction reference already exists")]
    DuplicateReference(String),

    #[error("{context}")]
    Persistence {
        context: &'static str,
        #[source]
        source: RepositoryError,
    },

    #[error("{message}")]
    Provider { reference: String, message: String },

    #[error("Payment request timed out. Check the status of {reference} before retrying.")]
    ProviderTimeout { reference: String },

    #[error("Payment not found")]
    NotFound(String),

    #[error("Payment {reference} is already {from}; cannot mark it {to}")]
    InvalidTransition {
        reference: String,
        from: PaymentStatus,
        to: PaymentStatus,
    },
}

impl PaymentError {
    pub(crate) fn persistence(context: &'static str, source: RepositoryError) -> Self {
        tracing::error!(error = %source, "{}", context);
        PaymentError::Persistence { context, source }
    }
}

/// Appends to the payment log. Failures are logged and swallowed.
pub(crate) async fn record_event(
    payments: &dyn PaymentRepository,
    reference: &str,
    kind: EventKind,
    message: &str,
) {
    if let Err(e) = payments.record_event(reference, kind, message).await {
        tracing::warn!(
            reference = %reference,
            event = %kind,
            error = %e,
            "Failed to record payment event"
        );
    }
}
