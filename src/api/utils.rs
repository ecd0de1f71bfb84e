//! API utility functions
//!
//! Pure, stateless helpers for request processing, kept out of the handlers
//! so they can be unit tested.

use axum::body::Body;
use axum::http::{HeaderMap, header};
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::api::error::ApiError;
use crate::ledger::TaskId;

/// Parses and validates the Content-Type of an image upload
///
/// Accepts any `image/*` type and `application/octet-stream`. A missing
/// header is accepted; the payload is sniffed later anyway.
pub fn parse_upload_content_type(headers: &HeaderMap) -> Result<Option<mime::Mime>, ApiError> {
    let Some(value) = headers.get(header::CONTENT_TYPE) else {
        return Ok(None);
    };

    let raw = value
        .to_str()
        .map_err(|_| ApiError::InvalidInput("Content-Type is not valid ASCII".into()))?;
    let media_type: mime::Mime = raw
        .parse()
        .map_err(|_| ApiError::InvalidInput(format!("invalid Content-Type: {}", raw)))?;

    let is_image = media_type.type_() == mime::IMAGE;
    let is_octets = media_type.type_() == mime::APPLICATION && media_type.subtype() == mime::OCTET_STREAM;
    if !is_image && !is_octets {
        return Err(ApiError::InvalidInput(format!(
            "Content-Type must be image/* or application/octet-stream, got: {}/{}",
            media_type.type_(),
            media_type.subtype()
        )));
    }

    Ok(Some(media_type))
}

/// Parses a task id from a path segment or query value
pub fn parse_task_id(raw: &str) -> Result<TaskId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::InvalidInput(format!("invalid task id: '{}'", raw)))
}

/// Reads the whole body, failing once it grows past `max_size` bytes
pub async fn read_limited(body: Body, max_size: usize) -> Result<Bytes, ApiError> {
    match Limited::new(body, max_size).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => Err(ApiError::payload_too_large(max_size)),
        Err(err) => Err(ApiError::InvalidInput(format!("failed to read body: {}", err))),
    }
}
