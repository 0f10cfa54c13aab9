//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use clipvault_core::error::{ErrorClass, ErrorMetadata};
use clipvault_core::SignedAccess;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Readers handed to [`Storage::put`].
pub type ByteReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ErrorMetadata for StorageError {
    fn error_class(&self) -> ErrorClass {
        match self {
            StorageError::InvalidKey(_) => ErrorClass::Validation,
            _ => ErrorClass::Storage,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            StorageError::UploadFailed(_) => "STORAGE_UPLOAD_FAILED",
            StorageError::DeleteFailed(_) => "STORAGE_DELETE_FAILED",
            StorageError::SigningFailed(_) => "STORAGE_SIGNING_FAILED",
            StorageError::NotFound(_) => "STORAGE_NOT_FOUND",
            StorageError::InvalidKey(_) => "STORAGE_INVALID_KEY",
            StorageError::BackendError(_) => "STORAGE_BACKEND_ERROR",
            StorageError::IoError(_) => "STORAGE_IO_ERROR",
            StorageError::ConfigError(_) => "STORAGE_CONFIG_ERROR",
        }
    }

    fn client_message(&self) -> String {
        match self {
            StorageError::InvalidKey(_) => self.to_string(),
            _ => "Object storage is unavailable".to_string(),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Object store gateway.
///
/// All backends (S3, local filesystem) implement this trait so the ingestion
/// orchestrator can work against any of them, or against a test double.
/// Objects are addressed by `(bucket, key)`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store the whole of `reader` under `bucket`/`key`.
    ///
    /// Returns only after the reader hit EOF and the object is durable. An existing
    /// object with the same key is overwritten.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        reader: ByteReader,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Delete an object.
    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// Issue a URL granting read access to one object for `ttl`.
    ///
    /// The expiry is fixed at issuance; a later read needs a fresh URL.
    async fn signed_read(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> StorageResult<SignedAccess>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Reject keys and bucket names that could escape their namespace.
pub(crate) fn validate_key(bucket: &str, key: &str) -> StorageResult<()> {
    if bucket.is_empty() || bucket.contains('/') || bucket.contains("..") {
        return Err(StorageError::InvalidKey(format!(
            "invalid bucket name: {}",
            bucket
        )));
    }
    if key.is_empty() || key.contains("..") || key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Expiry timestamp of a URL issued now with the given lifetime.
pub(crate) fn expiry_from_now(ttl: Duration) -> StorageResult<chrono::DateTime<chrono::Utc>> {
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|e| StorageError::SigningFailed(format!("invalid ttl: {}", e)))?;
    Ok(chrono::Utc::now() + ttl)
}
