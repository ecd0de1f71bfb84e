use std::collections::HashMap;
use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};

use super::models::HealthResponse;
use super::state::ServiceInfo;
use crate::observability::Metrics;

/// `/health` and `/metrics`, mounted on every role
pub fn router(role: &'static str, metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_snapshot))
        .with_state(ServiceInfo { role, metrics })
}

/// Health check endpoint (GET /health)
///
/// A process that can answer is healthy; dependencies are only resolved at startup.
pub async fn health(State(info): State<ServiceInfo>) -> impl IntoResponse {
    let mut components = HashMap::new();
    components.insert(info.role.to_string(), "healthy".to_string());

    let response = HealthResponse {
        status: "healthy".to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}

/// Counter snapshot (GET /metrics)
pub async fn metrics_snapshot(State(info): State<ServiceInfo>) -> impl IntoResponse {
    Json(info.metrics.snapshot())
}
