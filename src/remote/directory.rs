use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::{RemoteError, base_url, checked};
use crate::api::ErrorCode;
use crate::directory::{DirectoryError, Result};

/// Client for the `directory` role
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    client: Client,
    base: String,
    max_retries: u32,
}

impl DirectoryClient {
    pub fn new(client: Client, address: &str, max_retries: u32) -> Self {
        Self {
            client,
            base: base_url(address),
            max_retries: max_retries.max(1),
        }
    }

    fn url(&self, key: &str) -> String {
        format!("{}/entries/{}", self.base, key)
    }

    pub async fn register(&self, key: &str, value: &str) -> Result<()> {
        let result = async {
            let response = self.client.put(self.url(key)).body(value.to_string()).send().await?;
            checked(response).await?;
            Ok::<_, RemoteError>(())
        }
        .await;
        result.map_err(|err| directory_error(err, key))
    }

    pub async fn lookup(&self, key: &str) -> Result<String> {
        let result = async {
            let response = self.client.get(self.url(key)).send().await?;
            Ok::<_, RemoteError>(checked(response).await?.text().await?)
        }
        .await;
        result.map_err(|err| directory_error(err, key))
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let result = async {
            let response = self.client.delete(self.url(key)).send().await?;
            checked(response).await?;
            Ok::<_, RemoteError>(())
        }
        .await;
        result.map_err(|err| directory_error(err, key))
    }

    pub async fn list(&self) -> Result<BTreeMap<String, String>> {
        let result = async {
            let response = self.client.get(format!("{}/entries", self.base)).send().await?;
            Ok::<_, RemoteError>(checked(response).await?.json::<BTreeMap<String, String>>().await?)
        }
        .await;
        result.map_err(|err| directory_error(err, ""))
    }

    /// Publish `value` under `key`, retrying while the directory is not up yet
    pub async fn register_with_retry(&self, key: &str, value: &str) -> Result<()> {
        with_retry(self.max_retries, key, || self.register(key, value)).await
    }

    /// Resolve `key`, retrying while the directory or the entry is missing
    pub async fn lookup_with_retry(&self, key: &str) -> Result<String> {
        with_retry(self.max_retries, key, || self.lookup(key)).await
    }
}

fn directory_error(err: RemoteError, key: &str) -> DirectoryError {
    match err {
        RemoteError::Api {
            code: ErrorCode::NotFound,
            ..
        } => DirectoryError::NotFound(key.to_string()),
        RemoteError::Api {
            code: ErrorCode::InvalidInput,
            message,
            ..
        } => DirectoryError::InvalidInput(message),
        other => DirectoryError::Unavailable(other.to_string()),
    }
}

/// Retry `attempt` with exponential backoff (1s, 2s, 4s, ...)
///
/// Invalid input is returned at once; it would fail the same way every time.
async fn with_retry<T, F, Fut>(max_retries: u32, key: &str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        match attempt().await {
            Ok(value) => {
                if attempts > 1 {
                    debug!(key, attempts, "Directory call succeeded after retry");
                }
                return Ok(value);
            }
            Err(err @ DirectoryError::InvalidInput(_)) => return Err(err),
            Err(err) => {
                if attempts >= max_retries {
                    warn!(key, attempts, error = %err, "Directory call failed after retries");
                    return Err(err);
                }

                warn!(key, attempts, error = %err, "Directory call failed, retrying");

                let backoff = Duration::from_secs(2u64.saturating_pow(attempts - 1));
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
