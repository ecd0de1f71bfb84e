//! Ingestion gateway: browser-facing upload form in front of the coordinator

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Query, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{Html, IntoResponse},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::info;

use super::error::ApiError;
use super::state::GatewayState;
use super::utils::parse_task_id;
use crate::ledger::TaskId;

const UPLOAD_FIELD: &str = "uploadfile";

const UPLOAD_FORM: &str = r#"<!DOCTYPE html>
<html>
<head><title>Upload image</title></head>
<body>
<form enctype="multipart/form-data" action="/submit" method="post">
  <input type="file" name="uploadfile" accept="image/png" />
  <input type="submit" value="Upload" />
</form>
</body>
</html>
"#;

pub const READY_MESSAGE: &str = "Your image is ready.";
pub const NOT_READY_MESSAGE: &str = "Your image is not ready yet.";

pub fn router(state: GatewayState) -> Router {
    // Multipart framing needs a little room past the file itself
    let body_limit = state.max_upload_bytes.saturating_add(64 * 1024);

    Router::new()
        .route("/", get(upload_form))
        .route("/submit", post(submit))
        .route("/ready", get(ready))
        .route("/image", get(image))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

impl IdQuery {
    fn task_id(&self) -> Result<TaskId, ApiError> {
        let raw = self
            .id
            .as_deref()
            .ok_or_else(|| ApiError::InvalidInput("missing 'id' query parameter".into()))?;
        parse_task_id(raw)
    }
}

/// GET /
pub async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

/// POST /submit with a multipart `uploadfile` field; replies with the id as text
pub async fn submit(
    State(state): State<GatewayState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, state.max_upload_bytes))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let data = field
                .bytes()
                .await
                .map_err(|e| multipart_error(e, state.max_upload_bytes))?;
            upload = Some(data);
            break;
        }
    }

    let data = upload.ok_or_else(|| ApiError::InvalidInput(format!("missing '{}' field", UPLOAD_FIELD)))?;
    if data.len() > state.max_upload_bytes {
        return Err(ApiError::payload_too_large(state.max_upload_bytes));
    }

    let id = state.submissions.submit(data).await?;
    info!(task_id = %id, "Upload forwarded");
    Ok((StatusCode::OK, id.to_string()))
}

/// GET /ready?id=n
pub async fn ready(
    State(state): State<GatewayState>,
    Query(query): Query<IdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let ready = state.submissions.is_ready(query.task_id()?).await?;
    Ok(if ready { READY_MESSAGE } else { NOT_READY_MESSAGE })
}

/// GET /image?id=n
pub async fn image(
    State(state): State<GatewayState>,
    Query(query): Query<IdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state.submissions.fetch(query.task_id()?).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], data))
}

fn multipart_error(err: MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(limit)
    } else {
        ApiError::InvalidInput(err.body_text())
    }
}
