//! HTTP clients for the other roles
//!
//! Each client implements the same trait as its in-process counterpart, so a
//! role never knows whether a dependency is local or remote. Error bodies are
//! decoded back into the typed error of the called module; anything else
//! (refused connection, timeout, undecodable body) becomes that module's
//! `Unavailable` variant.

use reqwest::{Client, Response};
use thiserror::Error;

use crate::api::ErrorCode;
use crate::api::models::ErrorResponse;
use crate::config::HttpConfig;

mod coordinator;
mod directory;
mod ledger;
mod storage;

pub use coordinator::CoordinatorClient;
pub use directory::DirectoryClient;
pub use ledger::LedgerClient;
pub use storage::BlobClient;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{code}: {message}")]
    Api { status: u16, code: ErrorCode, message: String },

    #[error("unexpected HTTP {0}")]
    Status(u16),
}

impl RemoteError {
    /// The error code sent by the remote service, if it sent one
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            RemoteError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RemoteError>;

/// Build the shared reqwest client
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout.as_duration())
        .timeout(config.request_timeout.as_duration())
        .user_agent(concat!("pixelq/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(RemoteError::Client)
}

/// `host:port` or a full URL, without a trailing slash
pub fn base_url(address: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}

/// Pass successful responses through, decode error bodies otherwise
pub(crate) async fn checked(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match response.json::<ErrorResponse>().await {
        Ok(body) => Err(RemoteError::Api {
            status: status.as_u16(),
            code: body.code,
            message: body.message,
        }),
        Err(_) => Err(RemoteError::Status(status.as_u16())),
    }
}
