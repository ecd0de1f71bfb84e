//! Blob storage for task input and output images
//!
//! Blobs are addressed by `(task id, stage)` only and overwritten on re-put.
//! The store has no concurrency logic of its own.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::ledger::TaskId;

mod object;

pub use object::ObjectBlobStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("blob {stage}/{id} not found")]
    NotFound { id: TaskId, stage: Stage },

    #[error("invalid stage '{0}', expected 'working' or 'finished'")]
    InvalidStage(String),

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Only produced by remote stores
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Lifecycle stage of a blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Raw upload waiting to be transformed
    Working,
    /// Transformed output
    Finished,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Working => "working",
            Stage::Finished => "finished",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "working" => Ok(Stage::Working),
            "finished" => Ok(Stage::Finished),
            other => Err(StorageError::InvalidStage(other.to_string())),
        }
    }
}

/// Byte store keyed by `(id, stage)`
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, id: TaskId, stage: Stage, data: Bytes) -> Result<()>;

    /// Fails with [`StorageError::NotFound`] when nothing was stored
    async fn get(&self, id: TaskId, stage: Stage) -> Result<Bytes>;
}
