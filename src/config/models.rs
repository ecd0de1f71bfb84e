use crate::humanize::{ByteSize, HumanDuration};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub limits: Limits,
}

/// Listening side of the current process
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Address published in the service directory. Falls back to `bind_addr`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertise_addr: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            advertise_addr: None,
        }
    }
}

impl ServerConfig {
    /// The address other processes should use to reach this one
    pub fn advertised(&self) -> String {
        self.advertise_addr
            .clone()
            .unwrap_or_else(|| self.bind_addr.to_string())
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Where the service directory lives and how hard to try reaching it
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DirectoryConfig {
    #[serde(default = "default_directory_address")]
    pub address: String,
    #[serde(default = "default_directory_retries")]
    pub max_retries: u32,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            address: default_directory_address(),
            max_retries: default_directory_retries(),
        }
    }
}

fn default_directory_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_directory_retries() -> u32 {
    5
}

/// Task ledger settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
    #[serde(default = "default_lease_duration")]
    pub lease_duration: HumanDuration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lease_duration: default_lease_duration(),
        }
    }
}

fn default_lease_duration() -> HumanDuration {
    HumanDuration::from_secs(120)
}

/// Worker pool settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    #[serde(default = "default_worker_count")]
    pub count: usize,
    #[serde(default = "default_backoff")]
    pub backoff: HumanDuration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
            backoff: default_backoff(),
        }
    }
}

fn default_worker_count() -> usize {
    4
}

fn default_backoff() -> HumanDuration {
    HumanDuration::from_secs(2)
}

/// Blob storage provider type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    #[default]
    Memory,
    Local,
}

/// Blob storage configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub provider: StorageProvider,
    /// Root directory for the `local` provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

/// Outbound HTTP client settings shared by every remote client
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(5)
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration::from_secs(30)
}

/// Request limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Limits {
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: ByteSize,
    /// Per-blob cap on the storage role. Transformed outputs can outgrow their input.
    #[serde(default = "default_max_blob_bytes")]
    pub max_blob_bytes: ByteSize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            max_blob_bytes: default_max_blob_bytes(),
        }
    }
}

fn default_max_upload_bytes() -> ByteSize {
    ByteSize(10 * 1024 * 1024)
}

// An RGBA re-encode of a palette or grayscale PNG is several times larger
fn default_max_blob_bytes() -> ByteSize {
    ByteSize(64 * 1024 * 1024)
}
