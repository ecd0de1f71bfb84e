use async_trait::async_trait;
use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::{ObjectStore, path::Path as StoragePath};
use std::path::Path;
use std::sync::Arc;

use crate::config::{StorageConfig, StorageProvider};
use crate::ledger::TaskId;

use super::{BlobStore, Result, Stage, StorageError};

/// Blob store backed by any `object_store` implementation
#[derive(Clone)]
pub struct ObjectBlobStore {
    store: Arc<dyn ObjectStore>,
}

impl ObjectBlobStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// In-memory storage for tests and standalone mode
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    /// Files under `root`, laid out as `{stage}/{id}.png`
    pub fn local(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let store = LocalFileSystem::new_with_prefix(root)?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        match (config.provider, &config.root) {
            (StorageProvider::Memory, _) => Ok(Self::in_memory()),
            (StorageProvider::Local, Some(root)) => Self::local(root),
            (StorageProvider::Local, None) => Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "local storage requires a root directory",
            ))),
        }
    }

    /// Check if a blob exists
    pub async fn exists(&self, id: TaskId, stage: Stage) -> Result<bool> {
        match self.store.head(&blob_path(id, stage)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn blob_path(id: TaskId, stage: Stage) -> StoragePath {
    StoragePath::from(format!("{}/{}.png", stage, id))
}

#[async_trait]
impl BlobStore for ObjectBlobStore {
    async fn put(&self, id: TaskId, stage: Stage, data: Bytes) -> Result<()> {
        let size = data.len();
        self.store.put(&blob_path(id, stage), data.into()).await?;

        tracing::debug!(task_id = %id, %stage, size, "Blob stored");
        Ok(())
    }

    async fn get(&self, id: TaskId, stage: Stage) -> Result<Bytes> {
        let result = match self.store.get(&blob_path(id, stage)).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(StorageError::NotFound { id, stage });
            }
            Err(e) => return Err(e.into()),
        };

        let bytes = result.bytes().await?;
        tracing::debug!(task_id = %id, %stage, size = bytes.len(), "Blob loaded");
        Ok(bytes)
    }
}
