use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::use_cases::PaymentError;

/// HTTP-facing error. Every variant renders as `{"success": false, "message": ...}`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("{0}")]
    Unauthorized(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Payment(e) => match e {
                PaymentError::Validation(_) => StatusCode::BAD_REQUEST,
                PaymentError::DuplicateReference(_) => StatusCode::CONFLICT,
                PaymentError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                PaymentError::Provider { .. } => StatusCode::BAD_GATEWAY,
                PaymentError::ProviderTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                PaymentError::NotFound(_) => StatusCode::NOT_FOUND,
                PaymentError::InvalidTransition { .. } => StatusCode::CONFLICT,
            },
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RepositoryError;
    use crate::validation::ValidationError;

    #[test]
    fn test_validation_error_status_code() {
        let error = AppError::from(PaymentError::from(ValidationError::new(
            "phone",
            "Phone number is required",
        )));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_string(), "Phone number is required");
    }

    #[test]
    fn test_duplicate_reference_status_code() {
        let error = AppError::from(PaymentError::DuplicateReference("LSUC_X".to_string()));
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
        assert_eq!(error.to_string(), "Transaction reference already exists");
    }

    #[test]
    fn test_persistence_error_hides_detail() {
        let error = AppError::from(PaymentError::Persistence {
            context: "Failed to create payment record",
            source: RepositoryError::Database(sqlx::Error::PoolTimedOut),
        });
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.to_string(), "Failed to create payment record");
    }

    #[test]
    fn test_provider_error_status_codes() {
        let rejected = AppError::from(PaymentError::Provider {
            reference: "R".to_string(),
            message: "declined".to_string(),
        });
        assert_eq!(rejected.status_code(), StatusCode::BAD_GATEWAY);

        let timeout = AppError::from(PaymentError::ProviderTimeout {
            reference: "R".to_string(),
        });
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_not_found_error_status_code() {
        let error = AppError::from(PaymentError::NotFound("R".to_string()));
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unauthorized_error_status_code() {
        let error = AppError::Unauthorized("Invalid callback signature".to_string());
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_error_response_status() {
        let response = AppError::Unauthorized("Invalid callback signature".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
