//! HTTP surface of the `ledger` role

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use super::error::ApiError;
use super::models::IdResponse;
use super::utils::parse_task_id;
use crate::ledger::TaskLedger;

pub fn router(ledger: TaskLedger) -> Router {
    Router::new()
        .route("/tasks", post(create_task).get(list_tasks))
        .route("/tasks/lease", post(assign_next))
        .route("/tasks/{id}", get(get_task))
        .route("/tasks/{id}/complete", post(complete_task))
        .route("/stats", get(stats))
        .with_state(ledger)
}

/// POST /tasks
pub async fn create_task(State(ledger): State<TaskLedger>) -> impl IntoResponse {
    let id = ledger.create_task().await;
    (StatusCode::CREATED, Json(IdResponse { id }))
}

/// GET /tasks
pub async fn list_tasks(State(ledger): State<TaskLedger>) -> impl IntoResponse {
    Json(ledger.list().await)
}

/// GET /tasks/{id}
pub async fn get_task(
    State(ledger): State<TaskLedger>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let task = ledger.get_task(parse_task_id(&id)?).await?;
    Ok(Json(task))
}

/// POST /tasks/lease
///
/// 404 `NO_WORK_AVAILABLE` is the normal idle answer, not a failure.
pub async fn assign_next(State(ledger): State<TaskLedger>) -> Result<impl IntoResponse, ApiError> {
    let task = ledger.assign_next().await?;
    Ok(Json(task))
}

/// POST /tasks/{id}/complete
pub async fn complete_task(
    State(ledger): State<TaskLedger>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let task = ledger.complete(parse_task_id(&id)?).await?;
    Ok(Json(task))
}

/// GET /stats
pub async fn stats(State(ledger): State<TaskLedger>) -> impl IntoResponse {
    Json(ledger.stats().await)
}
