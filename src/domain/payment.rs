//! Payment domain entity.
//! Framework-agnostic representation of one mobile-money payment attempt.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Provider label stored when none is given.
pub const DEFAULT_PROVIDER: &str = "MobileMoney";

/// Lifecycle of a payment. `Pending` resolves to exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Successful,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Successful => "successful",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown payment status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "successful" => Ok(PaymentStatus::Successful),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A stored payment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: i64,
    pub transaction_reference: String,
    pub phone_number: String,
    pub amount: BigDecimal,
    pub status: PaymentStatus,
    pub provider: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Audit events appended to the payment log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Initiated,
    ProviderFailed,
    CallbackVerified,
    CallbackRejected,
    Expired,
    ManualResolution,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Initiated => "initiated",
            EventKind::ProviderFailed => "provider_failed",
            EventKind::CallbackVerified => "callback_verified",
            EventKind::CallbackRejected => "callback_rejected",
            EventKind::Expired => "expired",
            EventKind::ManualResolution => "manual_resolution",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub id: i64,
    pub transaction_reference: String,
    pub event_type: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Successful,
            PaymentStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<PaymentStatus>(), Ok(status));
        }
    }

    #[test]
    fn rejects_unknown_status() {
        let err = "completed".parse::<PaymentStatus>().unwrap_err();
        assert_eq!(err, UnknownStatus("completed".to_string()));
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Successful.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_value(PaymentStatus::Successful).unwrap();
        assert_eq!(json, "successful");
    }
}
