pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod ports;
pub mod startup;
pub mod use_cases;
pub mod utils;
pub mod validation;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::AllowedOrigins;
use crate::domain::ReferenceGenerator;
use crate::ports::{MobileMoneyProvider, PaymentRepository};

#[derive(Clone)]
pub struct AppState {
    pub payments: Arc<dyn PaymentRepository>,
    pub provider: Arc<dyn MobileMoneyProvider>,
    pub references: ReferenceGenerator,
    pub callback_secret: Option<String>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        provider: Arc<dyn MobileMoneyProvider>,
        references: ReferenceGenerator,
    ) -> Self {
        Self {
            payments,
            provider,
            references,
            callback_secret: None,
            start_time: Instant::now(),
        }
    }

    pub fn with_callback_secret(mut self, secret: Option<String>) -> Self {
        self.callback_secret = secret;
        self
    }
}

pub fn create_app(state: AppState, origins: &AllowedOrigins) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/payments/initiate", post(handlers::payments::initiate))
        .route(
            "/payments/callback",
            post(handlers::payments::callback).get(handlers::payments::status),
        )
        .route("/payments/status", get(handlers::payments::status))
        .layer(cors_layer(origins))
        .layer(axum::middleware::from_fn(
            middleware::request_logger_middleware,
        ))
        .with_state(state)
}

fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    match origins {
        AllowedOrigins::Any => layer.allow_origin(Any),
        AllowedOrigins::List(list) => layer.allow_origin(AllowOrigin::list(
            list.iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        )),
    }
}
