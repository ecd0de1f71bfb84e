//! HTTP surface of the `directory` role

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use super::error::ApiError;
use crate::directory::ServiceDirectory;

pub fn router(directory: ServiceDirectory) -> Router {
    Router::new()
        .route("/entries", get(list_entries))
        .route("/entries/{key}", get(lookup).put(register).delete(remove))
        .with_state(directory)
}

/// PUT /entries/{key} with the value as plain-text body
pub async fn register(
    State(directory): State<ServiceDirectory>,
    Path(key): Path<String>,
    value: String,
) -> Result<impl IntoResponse, ApiError> {
    directory.register(&key, &value).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /entries/{key}
pub async fn lookup(
    State(directory): State<ServiceDirectory>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(directory.lookup(&key).await?)
}

/// DELETE /entries/{key}
pub async fn remove(
    State(directory): State<ServiceDirectory>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    directory.remove(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /entries
pub async fn list_entries(State(directory): State<ServiceDirectory>) -> impl IntoResponse {
    Json(directory.list().await)
}
