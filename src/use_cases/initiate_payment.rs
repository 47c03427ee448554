//! Initiate payment use case.
//! Validates intake, records a pending payment and asks the provider to
//! prompt the subscriber.

use std::sync::Arc;

use crate::domain::{EventKind, PaymentStatus, ReferenceGenerator};
use crate::ports::{CollectionRequest, MobileMoneyProvider, PaymentRepository, ProviderError};
use crate::use_cases::{record_event, PaymentError, MSG_CREATE_FAILED, MSG_PROVIDER_FAILED};
use crate::validation;

pub const MSG_INITIATED: &str =
    "Payment request initiated successfully. Check your phone for the payment prompt.";

/// Raw intake fields, already trimmed.
#[derive(Debug, Clone)]
pub struct InitiateInput {
    pub phone: String,
    pub amount: String,
}

#[derive(Debug, Clone)]
pub struct InitiateOutput {
    pub transaction_reference: String,
    pub payment_id: i64,
}

pub struct InitiatePayment {
    payments: Arc<dyn PaymentRepository>,
    provider: Arc<dyn MobileMoneyProvider>,
    references: ReferenceGenerator,
}

impl InitiatePayment {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        provider: Arc<dyn MobileMoneyProvider>,
        references: ReferenceGenerator,
    ) -> Self {
        Self {
            payments,
            provider,
            references,
        }
    }

    pub async fn execute(&self, input: InitiateInput) -> Result<InitiateOutput, PaymentError> {
        let amount = validation::validate_intake(&input.phone, &input.amount)?;

        let reference = self.references.generate();
        let taken = self
            .payments
            .exists(&reference)
            .await
            .map_err(|e| PaymentError::persistence(MSG_CREATE_FAILED, e))?;
        if taken {
            tracing::warn!(reference = %reference, "Generated reference already exists");
            return Err(PaymentError::DuplicateReference(reference));
        }

        let payment_id = self
            .payments
            .create(&reference, &input.phone, &amount)
            .await
            .map_err(|e| PaymentError::persistence(MSG_CREATE_FAILED, e))?;

        tracing::info!(
            reference = %reference,
            payment_id,
            amount = %amount,
            "Payment record created"
        );
        record_event(
            self.payments.as_ref(),
            &reference,
            EventKind::Initiated,
            &format!("amount {} via {}", amount, self.provider.name()),
        )
        .await;

        let request = CollectionRequest {
            reference: reference.clone(),
            phone_number: input.phone,
            amount,
        };

        match self.provider.request_payment(&request).await {
            Ok(ack) => {
                tracing::info!(
                    reference = %reference,
                    provider_transaction_id = %ack.transaction_id,
                    "Payment prompt sent"
                );
                Ok(InitiateOutput {
                    transaction_reference: reference,
                    payment_id,
                })
            }
            Err(e) => Err(self.provider_failure(reference, e).await),
        }
    }

    async fn provider_failure(&self, reference: String, error: ProviderError) -> PaymentError {
        if !error.is_definite() {
            tracing::warn!(
                reference = %reference,
                error = %error,
                "Provider outcome unknown; payment left pending"
            );
            return match error {
                ProviderError::Timeout => PaymentError::ProviderTimeout { reference },
                _ => PaymentError::Provider {
                    reference,
                    message: MSG_PROVIDER_FAILED.to_string(),
                },
            };
        }

        tracing::error!(reference = %reference, error = %error, "Provider rejected payment request");
        match self
            .payments
            .resolve_pending(&reference, PaymentStatus::Failed)
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::warn!(reference = %reference, "Payment no longer pending; status kept"),
            Err(e) => tracing::error!(reference = %reference, error = %e, "Failed to mark payment failed"),
        }
        record_event(
            self.payments.as_ref(),
            &reference,
            EventKind::ProviderFailed,
            &error.to_string(),
        )
        .await;

        let message = match error {
            ProviderError::Rejected(reason) if !reason.trim().is_empty() => reason,
            _ => MSG_PROVIDER_FAILED.to_string(),
        };
        PaymentError::Provider { reference, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryPaymentRepository, SimulatedProvider};
    use crate::ports::{CollectionAck, Verification};
    use crate::validation::{AMOUNT_INVALID, PHONE_INVALID, PHONE_REQUIRED};
    use async_trait::async_trait;

    struct FailingProvider(fn() -> ProviderError);

    #[async_trait]
    impl MobileMoneyProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn request_payment(
            &self,
            _request: &CollectionRequest,
        ) -> Result<CollectionAck, ProviderError> {
            Err((self.0)())
        }

        async fn verify_payment(&self, _reference: &str) -> Result<Verification, ProviderError> {
            Err((self.0)())
        }
    }

    fn use_case(
        repo: &InMemoryPaymentRepository,
        provider: Arc<dyn MobileMoneyProvider>,
    ) -> InitiatePayment {
        InitiatePayment::new(Arc::new(repo.clone()), provider, ReferenceGenerator::default())
    }

    fn input(phone: &str, amount: &str) -> InitiateInput {
        InitiateInput {
            phone: phone.to_string(),
            amount: amount.to_string(),
        }
    }

    #[tokio::test]
    async fn creates_pending_record() {
        let repo = InMemoryPaymentRepository::new();
        let output = use_case(&repo, Arc::new(SimulatedProvider::new()))
            .execute(input("0971234567", "100.00"))
            .await
            .unwrap();

        assert!(ReferenceGenerator::default().is_well_formed(&output.transaction_reference));
        let record = repo
            .get_by_reference(&output.transaction_reference)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.id, output.payment_id);
        assert_eq!(record.status, PaymentStatus::Pending);
        assert_eq!(record.amount.to_string(), "100.00");
        assert_eq!(record.phone_number, "0971234567");

        let events = repo.list_events(&output.transaction_reference).await.unwrap();
        assert_eq!(events[0].event_type, "initiated");
    }

    #[tokio::test]
    async fn validation_failure_creates_nothing() {
        let repo = InMemoryPaymentRepository::new();
        let uc = use_case(&repo, Arc::new(SimulatedProvider::new()));

        let err = uc.execute(input("", "10")).await.unwrap_err();
        assert_eq!(err.to_string(), PHONE_REQUIRED);

        let err = uc.execute(input("0571234567", "10")).await.unwrap_err();
        assert_eq!(err.to_string(), PHONE_INVALID);

        let err = uc.execute(input("0971234567", "12345678901")).await.unwrap_err();
        assert_eq!(err.to_string(), AMOUNT_INVALID);

        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn store_outage_is_persistence_error() {
        let repo = InMemoryPaymentRepository::new();
        repo.set_offline(true);

        let err = use_case(&repo, Arc::new(SimulatedProvider::new()))
            .execute(input("0971234567", "100"))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Persistence { .. }));
        assert_eq!(err.to_string(), MSG_CREATE_FAILED);
    }

    #[tokio::test]
    async fn rejected_request_marks_payment_failed() {
        let repo = InMemoryPaymentRepository::new();
        let provider = FailingProvider(|| ProviderError::Rejected("insufficient funds".to_string()));

        let err = use_case(&repo, Arc::new(provider))
            .execute(input("0771234567", "50"))
            .await
            .unwrap_err();

        let PaymentError::Provider { reference, message } = err else {
            panic!("expected provider error");
        };
        assert_eq!(message, "insufficient funds");
        let record = repo.get_by_reference(&reference).await.unwrap().unwrap();
        assert_eq!(record.status, PaymentStatus::Failed);

        let kinds: Vec<_> = repo
            .list_events(&reference)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.event_type)
            .collect();
        assert_eq!(kinds, vec!["initiated", "provider_failed"]);
    }

    #[tokio::test]
    async fn unavailable_provider_uses_generic_message() {
        let repo = InMemoryPaymentRepository::new();
        let provider = FailingProvider(|| ProviderError::Unavailable("connection refused".to_string()));

        let err = use_case(&repo, Arc::new(provider))
            .execute(input("0771234567", "50"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), MSG_PROVIDER_FAILED);
    }

    #[tokio::test]
    async fn timeout_leaves_payment_pending() {
        let repo = InMemoryPaymentRepository::new();
        let provider = FailingProvider(|| ProviderError::Timeout);

        let err = use_case(&repo, Arc::new(provider))
            .execute(input("0971234567", "75.25"))
            .await
            .unwrap_err();

        let PaymentError::ProviderTimeout { reference } = err else {
            panic!("expected timeout");
        };
        let record = repo.get_by_reference(&reference).await.unwrap().unwrap();
        assert_eq!(record.status, PaymentStatus::Pending);
    }
}
