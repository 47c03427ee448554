use async_trait::async_trait;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use url::Url;

use crate::ports::{CollectionAck, CollectionRequest, MobileMoneyProvider, ProviderError, Verification};

pub const HTTP_PROVIDER_NAME: &str = "http";

type Breaker = StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>;

/// JSON-over-HTTP mobile-money client guarded by a circuit breaker.
///
/// `POST {base}/collections` pushes a payment prompt to the subscriber and
/// `GET {base}/collections/{reference}` reports whether it was paid.
#[derive(Clone)]
pub struct HttpProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    circuit_breaker: Breaker,
}

impl HttpProvider {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Self {
        Self::with_circuit_breaker(base_url, api_key, timeout, 3, 60)
    }

    pub fn with_circuit_breaker(
        base_url: String,
        api_key: Option<String>,
        timeout: Duration,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        HttpProvider {
            client,
            base_url,
            api_key,
            circuit_breaker,
        }
    }

    /// Returns the current state of the circuit breaker
    pub fn circuit_state(&self) -> &'static str {
        if self.circuit_breaker.is_call_permitted() {
            "closed"
        } else {
            "open"
        }
    }

    /// Appends `segments` to the base URL, percent-encoding each one so a
    /// caller-supplied reference cannot leave its path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        if segments.iter().any(|s| s.is_empty() || *s == "." || *s == "..") {
            return Err(ProviderError::Rejected("invalid path segment".to_string()));
        }

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::Unavailable(format!("invalid provider URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Unavailable("provider URL cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn guarded<T, F>(&self, call: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match self.circuit_breaker.call_with(trips_breaker, call).await {
            Ok(value) => Ok(value),
            Err(FailsafeError::Rejected) => Err(ProviderError::Unavailable(
                "provider circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

/// Business rejections come from a healthy provider and never open the breaker.
fn trips_breaker(error: &ProviderError) -> bool {
    !matches!(error, ProviderError::Rejected(_))
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else if e.is_connect() {
        ProviderError::Unavailable(e.to_string())
    } else {
        ProviderError::Interrupted(e.to_string())
    }
}

async fn status_error(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    if status.is_server_error() {
        return ProviderError::Unavailable(format!("provider returned {}", status));
    }

    let body = response.text().await.unwrap_or_default();
    if body.is_empty() {
        ProviderError::Rejected(status.to_string())
    } else {
        ProviderError::Rejected(body)
    }
}

#[async_trait]
impl MobileMoneyProvider for HttpProvider {
    fn name(&self) -> &str {
        HTTP_PROVIDER_NAME
    }

    async fn request_payment(
        &self,
        request: &CollectionRequest,
    ) -> Result<CollectionAck, ProviderError> {
        let url = self.endpoint(&["collections"])?;
        let builder = self.authorize(self.client.post(url).json(request));

        self.guarded(async move {
            let response = builder.send().await.map_err(transport_error)?;
            if !response.status().is_success() {
                return Err(status_error(response).await);
            }

            response
                .json::<CollectionAck>()
                .await
                .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
        })
        .await
    }

    async fn verify_payment(&self, reference: &str) -> Result<Verification, ProviderError> {
        let url = self.endpoint(&["collections", reference])?;
        let builder = self.authorize(self.client.get(url));

        self.guarded(async move {
            let response = builder.send().await.map_err(transport_error)?;
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(Verification {
                    verified: false,
                    details: None,
                });
            }
            if !response.status().is_success() {
                return Err(status_error(response).await);
            }

            response
                .json::<Verification>()
                .await
                .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
        })
        .await
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        if !self.circuit_breaker.is_call_permitted() {
            return Err(ProviderError::Unavailable(
                "provider circuit breaker is open".to_string(),
            ));
        }

        let response = self
            .client
            .get(self.endpoint(&["health"])?)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::Unavailable(format!(
                "provider health returned {}",
                response.status()
            )))
        }
    }
}
