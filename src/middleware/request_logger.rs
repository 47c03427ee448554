use axum::{
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn request_logger_middleware<B>(mut req: Request<B>, next: Next<B>) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let header = HeaderValue::from_str(&request_id).ok();

    // Insert request ID into headers for downstream handlers
    if let Some(value) = header.clone() {
        req.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Incoming request"
    );

    let mut response = next.run(req).await;

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        latency_ms = start.elapsed().as_millis(),
        "Outgoing response"
    );

    if let Some(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::post, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_request_logger_adds_request_id() {
        let app = Router::new()
            .route("/test", post(|| async { "ok" }))
            .layer(axum::middleware::from_fn(request_logger_middleware));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }
}
