use std::sync::Arc;

use crate::coordinator::{Coordinator, SubmissionApi};
use crate::observability::Metrics;
use crate::storage::BlobStore;

/// Shared by every role for `/health` and `/metrics`
#[derive(Clone)]
pub struct ServiceInfo {
    pub role: &'static str,
    pub metrics: Arc<Metrics>,
}

#[derive(Clone)]
pub struct StorageState {
    pub blobs: Arc<dyn BlobStore>,
    pub max_blob_bytes: usize,
}

#[derive(Clone)]
pub struct CoordinatorState {
    pub coordinator: Arc<Coordinator>,
    pub max_upload_bytes: usize,
}

#[derive(Clone)]
pub struct GatewayState {
    pub submissions: Arc<dyn SubmissionApi>,
    pub max_upload_bytes: usize,
}
