use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::ports::{MobileMoneyProvider, PaymentRepository};

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);
const CRITICAL_DEPENDENCIES: [&str; 1] = ["store"];

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: HashMap<String, DependencyStatus>,
}

impl HealthResponse {
    pub fn is_unhealthy(&self) -> bool {
        self.status == "unhealthy"
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyStatus {
    Healthy { status: String, latency_ms: u64 },
    Unhealthy { status: String, error: String },
}

impl DependencyStatus {
    fn healthy(start: Instant) -> Self {
        DependencyStatus::Healthy {
            status: "healthy".to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn unhealthy(error: impl ToString) -> Self {
        DependencyStatus::Unhealthy {
            status: "unhealthy".to_string(),
            error: error.to_string(),
        }
    }
}

#[async_trait]
pub trait DependencyChecker: Send + Sync {
    fn name(&self) -> &'static str;
    async fn check(&self) -> DependencyStatus;
}

pub struct StoreChecker {
    payments: Arc<dyn PaymentRepository>,
}

impl StoreChecker {
    pub fn new(payments: Arc<dyn PaymentRepository>) -> Self {
        Self { payments }
    }
}

#[async_trait]
impl DependencyChecker for StoreChecker {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn check(&self) -> DependencyStatus {
        let start = Instant::now();
        match self.payments.ping().await {
            Ok(()) => DependencyStatus::healthy(start),
            Err(e) => DependencyStatus::unhealthy(e),
        }
    }
}

pub struct ProviderChecker {
    provider: Arc<dyn MobileMoneyProvider>,
}

impl ProviderChecker {
    pub fn new(provider: Arc<dyn MobileMoneyProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl DependencyChecker for ProviderChecker {
    fn name(&self) -> &'static str {
        "provider"
    }

    async fn check(&self) -> DependencyStatus {
        let start = Instant::now();
        match self.provider.ping().await {
            Ok(()) => DependencyStatus::healthy(start),
            Err(e) => DependencyStatus::unhealthy(e),
        }
    }
}

pub async fn check_health(
    store: StoreChecker,
    provider: ProviderChecker,
    start_time: Instant,
) -> HealthResponse {
    let (store_result, provider_result) = tokio::join!(
        timeout(CHECK_TIMEOUT, store.check()),
        timeout(CHECK_TIMEOUT, provider.check())
    );

    let mut dependencies = HashMap::new();
    dependencies.insert(
        store.name().to_string(),
        store_result.unwrap_or_else(|_| DependencyStatus::unhealthy("timeout")),
    );
    dependencies.insert(
        provider.name().to_string(),
        provider_result.unwrap_or_else(|_| DependencyStatus::unhealthy("timeout")),
    );

    HealthResponse {
        status: determine_overall_status(&dependencies),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
        dependencies,
    }
}

fn determine_overall_status(dependencies: &HashMap<String, DependencyStatus>) -> String {
    let mut has_critical_failure = false;
    let mut has_non_critical_failure = false;

    for (name, status) in dependencies {
        if matches!(status, DependencyStatus::Unhealthy { .. }) {
            if CRITICAL_DEPENDENCIES.contains(&name.as_str()) {
                has_critical_failure = true;
            } else {
                has_non_critical_failure = true;
            }
        }
    }

    if has_critical_failure {
        "unhealthy".to_string()
    } else if has_non_critical_failure {
        "degraded".to_string()
    } else {
        "healthy".to_string()
    }
}
