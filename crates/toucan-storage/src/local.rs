use crate::keys::validate_path;
use crate::signing::{token_expiry, UploadTokenSigner};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use toucan_core::models::SignedTarget;

/// Local filesystem storage for one bucket
///
/// Objects live under `{base_path}/{bucket}/{path}`. Signed targets carry an
/// HMAC token; each token is accepted once.
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
    bucket: String,
    base_url: String,
    signer: UploadTokenSigner,
    /// Used tokens and their expiry; entries are dropped once expired
    consumed_tokens: Arc<Mutex<HashMap<String, i64>>>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory shared by all buckets (e.g., "/var/lib/toucan")
    /// * `bucket` - Bucket name, used as a subdirectory
    /// * `base_url` - Base URL the files are served from (e.g., "http://localhost:3000/storage")
    /// * `signer` - Issues and checks upload tokens
    pub async fn new(
        base_path: impl Into<PathBuf>,
        bucket: impl Into<String>,
        base_url: String,
        signer: UploadTokenSigner,
    ) -> StorageResult<Self> {
        let bucket = bucket.into();
        validate_path(&bucket)?;
        let root = base_path.into().join(&bucket);

        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            root,
            bucket,
            base_url,
            signer,
            consumed_tokens: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Convert an object path to a filesystem path inside the bucket directory
    fn key_to_path(&self, path: &str) -> StorageResult<PathBuf> {
        validate_path(path)?;

        let full = self.root.join(path);
        let root_canonical = self.root.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = full.canonicalize() {
            if canonical.strip_prefix(&root_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage path resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(full)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Mark a token as used; false if it was already used
    ///
    /// Expired tokens fail verification anyway, so they are pruned here.
    fn claim_token(&self, token: &str) -> StorageResult<bool> {
        let expiry = token_expiry(token).ok_or_else(|| {
            StorageError::SignatureRejected("Invalid upload token".to_string())
        })?;
        let mut consumed = self
            .consumed_tokens
            .lock()
            .map_err(|_| StorageError::BackendError("Token registry poisoned".to_string()))?;

        let now = Utc::now().timestamp();
        consumed.retain(|_, expires_at| *expires_at >= now);
        if consumed.contains_key(token) {
            return Ok(false);
        }
        consumed.insert(token.to_string(), expiry);
        Ok(true)
    }

    fn release_token(&self, token: &str) {
        if let Ok(mut consumed) = self.consumed_tokens.lock() {
            consumed.remove(token);
        }
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        self.ensure_parent_dir(path).await?;

        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.bucket,
            path
        )
    }

    async fn create_signed_upload_target(
        &self,
        path: &str,
        expires_in: Duration,
    ) -> StorageResult<SignedTarget> {
        validate_path(path)?;
        let token = self.signer.sign(&self.bucket, path, expires_in)?;
        let upload_url = format!(
            "{}/upload/sign/{}/{}?token={}",
            self.base_url.trim_end_matches('/'),
            self.bucket,
            path,
            token
        );

        tracing::debug!(
            bucket = %self.bucket,
            key = %path,
            expires_in_secs = expires_in.as_secs(),
            "Local signed upload target created"
        );

        Ok(SignedTarget {
            path: path.to_string(),
            token,
            upload_url,
        })
    }

    async fn upload_to_signed_target(
        &self,
        target: &SignedTarget,
        _content_type: &str,
        data: Bytes,
    ) -> StorageResult<()> {
        let path = self.key_to_path(&target.path)?;
        self.signer.verify(&self.bucket, &target.path, &target.token)?;

        if !self.claim_token(&target.token)? {
            return Err(StorageError::SignatureRejected(
                "Upload token has already been used".to_string(),
            ));
        }

        let start = std::time::Instant::now();
        let size = data.len();

        if let Err(e) = self.write_file(&path, &data).await {
            self.release_token(&target.token);
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %target.path,
                size_bytes = size,
                "Local storage upload failed"
            );
            return Err(e);
        }

        tracing::info!(
            path = %path.display(),
            key = %target.path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        let full = self.key_to_path(path)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&full).await.unwrap_or(false) {
            return Err(StorageError::NotFound(path.to_string()));
        }

        let data = fs::read(&full).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", full.display(), e))
        })?;

        tracing::debug!(
            key = %path,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(data)
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let full = self.key_to_path(path)?;
        Ok(fs::try_exists(&full).await.unwrap_or(false))
    }

    async fn remove(&self, paths: &[String]) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let mut removed = 0usize;

        for path in paths {
            let full = self.key_to_path(path)?;
            if !fs::try_exists(&full).await.unwrap_or(false) {
                continue;
            }
            fs::remove_file(&full).await.map_err(|e| {
                StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    full.display(),
                    e
                ))
            })?;
            removed += 1;
        }

        tracing::info!(
            bucket = %self.bucket,
            requested = paths.len(),
            removed,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage remove completed"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
