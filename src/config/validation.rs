use super::models::{Config, StorageProvider};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("worker.count must be at least 1")]
    NoWorkers,

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("limits.max_upload_bytes must be greater than zero")]
    ZeroUploadLimit,

    #[error("limits.max_blob_bytes ({blob}) must be at least limits.max_upload_bytes ({upload})")]
    BlobLimitBelowUpload { blob: u64, upload: u64 },

    #[error("storage provider is local but storage.root is not set")]
    MissingStorageRoot,

    #[error("directory.max_retries must be at least 1")]
    NoDirectoryRetries,

    #[error("directory.address must not be empty")]
    EmptyDirectoryAddress,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_worker(config)?;
    validate_durations(config)?;
    validate_storage(config)?;
    validate_directory(config)?;

    let upload = config.limits.max_upload_bytes.as_u64();
    if upload == 0 {
        return Err(ValidationError::ZeroUploadLimit);
    }

    let blob = config.limits.max_blob_bytes.as_u64();
    if blob < upload {
        return Err(ValidationError::BlobLimitBelowUpload { blob, upload });
    }

    Ok(())
}

fn validate_worker(config: &Config) -> Result<(), ValidationError> {
    if config.worker.count == 0 {
        return Err(ValidationError::NoWorkers);
    }
    Ok(())
}

fn validate_durations(config: &Config) -> Result<(), ValidationError> {
    let durations = [
        ("ledger.lease_duration", config.ledger.lease_duration),
        ("worker.backoff", config.worker.backoff),
        ("http.connect_timeout", config.http.connect_timeout),
        ("http.request_timeout", config.http.request_timeout),
    ];

    for (field, value) in durations {
        if value.is_zero() {
            return Err(ValidationError::ZeroDuration { field });
        }
    }
    Ok(())
}

fn validate_storage(config: &Config) -> Result<(), ValidationError> {
    if config.storage.provider == StorageProvider::Local && config.storage.root.is_none() {
        return Err(ValidationError::MissingStorageRoot);
    }
    Ok(())
}

fn validate_directory(config: &Config) -> Result<(), ValidationError> {
    if config.directory.address.trim().is_empty() {
        return Err(ValidationError::EmptyDirectoryAddress);
    }
    if config.directory.max_retries == 0 {
        return Err(ValidationError::NoDirectoryRetries);
    }
    Ok(())
}
