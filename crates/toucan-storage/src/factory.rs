#[cfg(feature = "storage-local")]
use crate::{LocalStorage, UploadTokenSigner};
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use std::sync::Arc;
use toucan_core::Config;

/// Storage for original photos and, optionally, their thumbnails
#[derive(Clone)]
pub struct BucketStorages {
    pub photos: Arc<dyn Storage>,
    pub thumbnails: Option<Arc<dyn Storage>>,
}

/// Create the configured storage backend bound to `bucket`
pub async fn create_storage(config: &Config, bucket: &str) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let region = config
                .s3_region()
                .or_else(|| config.aws_region())
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
                })?;
            let endpoint = config.s3_endpoint().map(String::from);

            let storage = S3Storage::new(bucket.to_string(), region, endpoint).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config.local_storage_base_url().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;
            let signer = UploadTokenSigner::new(config.storage_signing_secret())?;

            let storage =
                LocalStorage::new(base_path, bucket, base_url.to_string(), signer).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

/// Create the photos storage and, when configured, the thumbnails storage
pub async fn create_bucket_storages(config: &Config) -> StorageResult<BucketStorages> {
    let photos = create_storage(config, config.photos_bucket()).await?;
    let thumbnails = match config.thumbnails_bucket() {
        Some(bucket) => Some(create_storage(config, bucket).await?),
        None => None,
    };

    tracing::info!(
        backend = %photos.backend_type(),
        photos_bucket = %config.photos_bucket(),
        thumbnails_bucket = ?config.thumbnails_bucket(),
        "Storage initialized"
    );

    Ok(BucketStorages { photos, thumbnails })
}
