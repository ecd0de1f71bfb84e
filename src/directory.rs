//! Service directory: string key/value registry used for address discovery
//!
//! Each role publishes its own address under a well-known key at startup and
//! resolves the addresses it depends on. There is no runtime re-resolution.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

pub const LEDGER_ADDRESS: &str = "ledger_address";
pub const STORAGE_ADDRESS: &str = "storage_address";
pub const COORDINATOR_ADDRESS: &str = "coordinator_address";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("invalid directory entry: {0}")]
    InvalidInput(String),

    #[error("no directory entry for '{0}'")]
    NotFound(String),

    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, DirectoryError>;

/// In-memory registry served by the `directory` role
#[derive(Debug, Clone, Default)]
pub struct ServiceDirectory {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl ServiceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`
    pub async fn register(&self, key: &str, value: &str) -> Result<()> {
        let key = non_empty("key", key)?;
        let value = non_empty("value", value)?;

        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());

        info!(key, value, "Directory entry registered");
        Ok(())
    }

    pub async fn lookup(&self, key: &str) -> Result<String> {
        let key = non_empty("key", key)?;
        self.entries
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(key.to_string()))
    }

    /// Remove `key`; absent keys are not an error
    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = non_empty("key", key)?;
        if self.entries.write().await.remove(key).is_some() {
            info!(key, "Directory entry removed");
        }
        Ok(())
    }

    pub async fn list(&self) -> BTreeMap<String, String> {
        self.entries.read().await.clone()
    }
}

fn non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DirectoryError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}
