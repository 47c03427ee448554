//! Status poll use case: returns the stored record verbatim.

use std::sync::Arc;

use crate::domain::PaymentRecord;
use crate::ports::PaymentRepository;
use crate::use_cases::{PaymentError, MSG_LOOKUP_FAILED};
use crate::validation::{self, ValidationError};

pub const MSG_REFERENCE_REQUIRED: &str = "Transaction reference required";

pub struct PaymentStatusQuery {
    payments: Arc<dyn PaymentRepository>,
}

impl PaymentStatusQuery {
    pub fn new(payments: Arc<dyn PaymentRepository>) -> Self {
        Self { payments }
    }

    pub async fn execute(&self, reference: &str) -> Result<PaymentRecord, PaymentError> {
        let reference = reference.trim();
        if validation::is_missing(reference) {
            return Err(ValidationError::new("ref", MSG_REFERENCE_REQUIRED).into());
        }

        self.payments
            .get_by_reference(reference)
            .await
            .map_err(|e| PaymentError::persistence(MSG_LOOKUP_FAILED, e))?
            .ok_or_else(|| PaymentError::NotFound(reference.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryPaymentRepository;
    use crate::domain::PaymentStatus;
    use bigdecimal::BigDecimal;

    #[tokio::test]
    async fn returns_stored_record() {
        let repo = InMemoryPaymentRepository::new();
        repo.create("REF-1", "0971234567", &BigDecimal::from(5)).await.unwrap();

        let record = PaymentStatusQuery::new(Arc::new(repo))
            .execute("REF-1")
            .await
            .unwrap();

        assert_eq!(record.transaction_reference, "REF-1");
        assert_eq!(record.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_reference_is_not_found() {
        let query = PaymentStatusQuery::new(Arc::new(InMemoryPaymentRepository::new()));

        let err = query.execute("REF-404").await.unwrap_err();
        assert!(matches!(err, PaymentError::NotFound(ref r) if r == "REF-404"));
        assert_eq!(err.to_string(), "Payment not found");

        let err = query.execute("").await.unwrap_err();
        assert_eq!(err.to_string(), MSG_REFERENCE_REQUIRED);
    }
}
