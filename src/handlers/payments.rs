use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

use crate::domain::PaymentRecord;
use crate::error::AppError;
use crate::use_cases::initiate_payment::MSG_INITIATED;
use crate::use_cases::{HandleCallback, InitiateInput, InitiatePayment, PaymentStatusQuery};
use crate::utils::sanitize::sanitize_json;
use crate::AppState;

pub const SIGNATURE_HEADER: &str = "x-callback-signature";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Default, Deserialize)]
pub struct InitiateRequest {
    #[serde(default)]
    pub phone: Option<Value>,
    #[serde(default)]
    pub amount: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct InitiateResponse {
    pub success: bool,
    pub message: &'static str,
    pub transaction_reference: String,
    pub payment_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub success: bool,
    pub message: &'static str,
    pub transaction_reference: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(rename = "ref")]
    pub reference: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub payment: PaymentRecord,
}

/// Text form of a JSON scalar: strings are trimmed, numbers printed, null is empty.
fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

/// Unparseable bodies are treated as empty so callers get field-level messages.
fn parse_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

pub async fn initiate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let raw = parse_body(&body);
    tracing::info!(payload = %sanitize_json(&raw), "Payment initiation requested");

    let request: InitiateRequest = serde_json::from_value(raw).unwrap_or_default();
    let input = InitiateInput {
        phone: field_text(request.phone.as_ref()),
        amount: field_text(request.amount.as_ref()),
    };

    let output = InitiatePayment::new(
        state.payments.clone(),
        state.provider.clone(),
        state.references.clone(),
    )
    .execute(input)
    .await?;

    Ok(Json(InitiateResponse {
        success: true,
        message: MSG_INITIATED,
        transaction_reference: output.transaction_reference,
        payment_id: output.payment_id,
    }))
}

pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    if let Some(secret) = state.callback_secret.as_deref() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|h| h.to_str().ok());

        if !signature.is_some_and(|sig| verify_signature(secret, &body, sig)) {
            tracing::warn!("Rejected callback with missing or invalid signature");
            return Err(AppError::Unauthorized("Invalid callback signature".to_string()));
        }
    }

    let payload = parse_body(&body);
    tracing::info!(payload = %sanitize_json(&payload), "Payment callback received");

    let reference = ["transaction_reference", "reference"]
        .iter()
        .find_map(|key| payload.get(*key).filter(|value| !value.is_null()));

    let outcome = HandleCallback::new(state.payments.clone(), state.provider.clone())
        .execute(&field_text(reference))
        .await?;

    Ok(Json(CallbackResponse {
        success: true,
        message: outcome.message,
        transaction_reference: outcome.transaction_reference,
    }))
}

pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, AppError> {
    let reference = query.reference.unwrap_or_default();
    let payment = PaymentStatusQuery::new(state.payments.clone())
        .execute(&reference)
        .await?;

    Ok(Json(StatusResponse {
        success: true,
        payment,
    }))
}

/// Checks a hex HMAC-SHA256 of `body` under `secret` in constant time.
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn field_text_normalises_scalars() {
        assert_eq!(field_text(None), "");
        assert_eq!(field_text(Some(&Value::Null)), "");
        assert_eq!(field_text(Some(&json!("  0971234567 "))), "0971234567");
        assert_eq!(field_text(Some(&json!(100.5))), "100.5");
        assert_eq!(field_text(Some(&json!(250))), "250");
    }

    #[test]
    fn invalid_json_is_empty_input() {
        assert_eq!(parse_body(b"{not json"), Value::Null);
        let request: InitiateRequest = serde_json::from_value(parse_body(b"")).unwrap_or_default();
        assert!(request.phone.is_none());
    }

    #[test]
    fn accepts_valid_signature() {
        let body = br#"{"reference":"LSUC_20240101_ABCDEF123456"}"#;
        let signature = sign("callback-secret", body);

        assert!(verify_signature("callback-secret", body, &signature));
    }

    #[test]
    fn rejects_wrong_signature() {
        let body = br#"{"reference":"LSUC_20240101_ABCDEF123456"}"#;
        let signature = sign("other-secret", body);

        assert!(!verify_signature("callback-secret", body, &signature));
        assert!(!verify_signature("callback-secret", body, "not-hex"));
        assert!(!verify_signature("callback-secret", b"tampered", &sign("callback-secret", body)));
    }
}
