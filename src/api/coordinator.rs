//! HTTP surface of the `coordinator` role
//!
//! Clients use `/submit`, `/tasks/{id}/ready` and `/tasks/{id}/result`.
//! Workers use `/lease` and `/tasks/{id}/finished`.

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};

use super::error::ApiError;
use super::models::{IdResponse, ReadyResponse};
use super::state::CoordinatorState;
use super::utils::{parse_task_id, parse_upload_content_type, read_limited};
use crate::coordinator::{SubmissionApi, WorkSource};

pub fn router(state: CoordinatorState) -> Router {
    Router::new()
        .route("/submit", post(submit))
        .route("/tasks", get(list_tasks))
        .route("/tasks/{id}/ready", get(is_ready))
        .route("/tasks/{id}/result", get(fetch_result))
        .route("/tasks/{id}/finished", post(report_finished))
        .route("/lease", post(lease_next))
        .with_state(state)
}

/// POST /submit
///
/// Body is the raw image. Returns 201 with the new task id.
pub async fn submit(
    State(state): State<CoordinatorState>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    parse_upload_content_type(&headers)?;
    let data = read_limited(body, state.max_upload_bytes).await?;

    let id = state.coordinator.submit(data).await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id })))
}

/// GET /tasks/{id}/ready
pub async fn is_ready(
    State(state): State<CoordinatorState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_task_id(&id)?;
    let ready = state.coordinator.is_ready(id).await?;
    Ok(Json(ReadyResponse { id, ready }))
}

/// GET /tasks/{id}/result
pub async fn fetch_result(
    State(state): State<CoordinatorState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state.coordinator.fetch(parse_task_id(&id)?).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], data))
}

/// POST /lease
pub async fn lease_next(State(state): State<CoordinatorState>) -> Result<impl IntoResponse, ApiError> {
    let task = state.coordinator.lease_next().await?;
    Ok(Json(task))
}

/// POST /tasks/{id}/finished
pub async fn report_finished(
    State(state): State<CoordinatorState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_task_id(&id)?;
    state.coordinator.report_finished(id).await?;
    Ok(Json(ReadyResponse { id, ready: true }))
}

/// GET /tasks
pub async fn list_tasks(State(state): State<CoordinatorState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.coordinator.list().await?))
}
