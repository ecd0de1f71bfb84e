//! HTTP surface of the `storage` role: raw blob bytes by stage and id

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::put,
};

use super::error::ApiError;
use super::state::StorageState;
use super::utils::{parse_task_id, read_limited};
use crate::storage::Stage;

pub fn router(state: StorageState) -> Router {
    Router::new()
        .route("/blobs/{stage}/{id}", put(put_blob).get(get_blob))
        .with_state(state)
}

/// PUT /blobs/{stage}/{id}
pub async fn put_blob(
    State(state): State<StorageState>,
    Path((stage, id)): Path<(String, String)>,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    let stage: Stage = stage.parse()?;
    let id = parse_task_id(&id)?;
    let data = read_limited(body, state.max_blob_bytes).await?;

    state.blobs.put(id, stage, data).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /blobs/{stage}/{id}
pub async fn get_blob(
    State(state): State<StorageState>,
    Path((stage, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let stage: Stage = stage.parse()?;
    let id = parse_task_id(&id)?;

    let data = state.blobs.get(id, stage).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], data))
}
