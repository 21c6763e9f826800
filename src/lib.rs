use axum::{middleware, routing::get, Router};
use std::sync::Arc;

pub mod config;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod services;

pub use config::{Config, ConfigError, ParameterStoreConfig};
pub use observability::{init_observability, shutdown_observability, Metrics};

use handlers::{
    create_api_router, liveness, metrics_handler, middleware::request_validation_middleware,
    middleware::security_headers_middleware, readiness, ApiState,
};
use observability::observability_middleware;

/// Assemble the full application router: API routes, health probes,
/// the metrics endpoint and all middleware layers.
pub fn create_app(metrics: Arc<Metrics>, state: ApiState) -> Router {
    let metrics_for_middleware = metrics.clone();

    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        .merge(create_api_router(state))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_validation_middleware))
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}
