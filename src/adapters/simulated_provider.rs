//! Provider stand-in used until a real mobile-money integration is configured.

use async_trait::async_trait;

use crate::ports::{CollectionAck, CollectionRequest, MobileMoneyProvider, ProviderError, Verification};

pub const SIMULATED_PROVIDER_NAME: &str = "simulated";

/// Accepts every collection request and verifies every reference.
#[derive(Debug, Clone, Default)]
pub struct SimulatedProvider;

impl SimulatedProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MobileMoneyProvider for SimulatedProvider {
    fn name(&self) -> &str {
        SIMULATED_PROVIDER_NAME
    }

    async fn request_payment(
        &self,
        request: &CollectionRequest,
    ) -> Result<CollectionAck, ProviderError> {
        tracing::debug!(reference = %request.reference, "simulated collection request accepted");
        Ok(CollectionAck {
            transaction_id: request.reference.clone(),
        })
    }

    async fn verify_payment(&self, reference: &str) -> Result<Verification, ProviderError> {
        tracing::debug!(reference = %reference, "simulated verification succeeded");
        Ok(Verification {
            verified: true,
            details: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    #[tokio::test]
    async fn echoes_reference_as_transaction_id() {
        let provider = SimulatedProvider::new();
        let ack = provider
            .request_payment(&CollectionRequest {
                reference: "LSUC_20240101_ABCDEF123456".to_string(),
                phone_number: "0971234567".to_string(),
                amount: BigDecimal::from(10),
            })
            .await
            .unwrap();

        assert_eq!(ack.transaction_id, "LSUC_20240101_ABCDEF123456");
    }

    #[tokio::test]
    async fn always_verifies() {
        let provider = SimulatedProvider::new();
        let verification = provider.verify_payment("anything").await.unwrap();

        assert!(verification.verified);
        assert!(provider.ping().await.is_ok());
    }
}
