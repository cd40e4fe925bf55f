//! Storage abstraction trait
//!
//! This module defines the bucket-scoped Storage trait that all backends implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;
use toucan_core::models::SignedTarget;
use toucan_core::AppError;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Signed upload rejected: {0}")]
    SignatureRejected(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => AppError::NotFound(format!("Object {}", path)),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Storage abstraction trait
///
/// One instance serves exactly one bucket. Uploads go through a two-step
/// handshake: the server side mints a [`SignedTarget`] for a path, then the
/// payload is sent to that target. Targets are short-lived and single-use.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Bucket this instance is bound to
    fn bucket(&self) -> &str;

    /// Publicly reachable URL for an object path
    fn public_url(&self, path: &str) -> String;

    /// Mint a write capability for `path`, valid for `expires_in`
    async fn create_signed_upload_target(
        &self,
        path: &str,
        expires_in: Duration,
    ) -> StorageResult<SignedTarget>;

    /// Send `data` to a previously minted target
    async fn upload_to_signed_target(
        &self,
        target: &SignedTarget,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<()>;

    /// Download an object by path
    async fn download(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Check if an object exists
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Remove objects; missing paths are not an error
    async fn remove(&self, paths: &[String]) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
