pub mod payments;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::health::{check_health, ProviderChecker, StoreChecker};
use crate::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = check_health(
        StoreChecker::new(state.payments.clone()),
        ProviderChecker::new(state.provider.clone()),
        state.start_time,
    )
    .await;

    // Return 503 if the store is down, 200 otherwise
    let status_code = if response.is_unhealthy() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(response))
}
