use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, header};

use super::{RemoteError, base_url, checked};
use crate::api::ErrorCode;
use crate::ledger::TaskId;
use crate::storage::{BlobStore, Result, Stage, StorageError};

/// [`BlobStore`] over HTTP, talking to the `storage` role
#[derive(Debug, Clone)]
pub struct BlobClient {
    client: Client,
    base: String,
}

impl BlobClient {
    pub fn new(client: Client, address: &str) -> Self {
        Self {
            client,
            base: base_url(address),
        }
    }

    fn url(&self, id: TaskId, stage: Stage) -> String {
        format!("{}/blobs/{}/{}", self.base, stage, id)
    }
}

fn storage_error(err: RemoteError, id: TaskId, stage: Stage) -> StorageError {
    match err.code() {
        Some(ErrorCode::NotFound) => StorageError::NotFound { id, stage },
        _ => StorageError::Unavailable(err.to_string()),
    }
}

#[async_trait]
impl BlobStore for BlobClient {
    async fn put(&self, id: TaskId, stage: Stage, data: Bytes) -> Result<()> {
        let result = async {
            let response = self
                .client
                .put(self.url(id, stage))
                .header(header::CONTENT_TYPE, "image/png")
                .body(data)
                .send()
                .await?;
            checked(response).await?;
            Ok::<_, RemoteError>(())
        }
        .await;
        result.map_err(|err| storage_error(err, id, stage))
    }

    async fn get(&self, id: TaskId, stage: Stage) -> Result<Bytes> {
        let result = async {
            let response = self.client.get(self.url(id, stage)).send().await?;
            Ok::<_, RemoteError>(checked(response).await?.bytes().await?)
        }
        .await;
        result.map_err(|err| storage_error(err, id, stage))
    }
}
