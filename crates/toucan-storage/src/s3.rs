use crate::keys::validate_path;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::join_all;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, Result as ObjectResult};
use std::time::Duration;
use toucan_core::models::SignedTarget;

const SIGNATURE_QUERY_PARAM: &str = "X-Amz-Signature";

/// S3 storage for one bucket
///
/// Signed targets are presigned PUT URLs; the token is the request signature.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    http: reqwest::Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            http,
            bucket,
            region,
            endpoint_url,
        })
    }
}

/// Path-style URL for S3-compatible endpoints, virtual-hosted style for AWS
fn object_url(bucket: &str, region: &str, endpoint_url: Option<&str>, key: &str) -> String {
    match endpoint_url {
        Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
        None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key),
    }
}

#[async_trait]
impl Storage for S3Storage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn public_url(&self, path: &str) -> String {
        object_url(
            &self.bucket,
            &self.region,
            self.endpoint_url.as_deref(),
            path,
        )
    }

    async fn create_signed_upload_target(
        &self,
        path: &str,
        expires_in: Duration,
    ) -> StorageResult<SignedTarget> {
        validate_path(path)?;
        let location = Path::from(path.to_string());

        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::PUT, &location, expires_in)
            .await;

        let url = url_result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %path,
                "S3 presign failed"
            );
            StorageError::BackendError(e.to_string())
        })?;

        let token = url
            .query_pairs()
            .find(|(name, _)| name == SIGNATURE_QUERY_PARAM)
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();

        Ok(SignedTarget {
            path: path.to_string(),
            token,
            upload_url: url.to_string(),
        })
    }

    async fn upload_to_signed_target(
        &self,
        target: &SignedTarget,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<()> {
        validate_path(&target.path)?;
        let size = data.len();
        let start = std::time::Instant::now();

        let response = self
            .http
            .put(&target.upload_url)
            .header(http::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %target.path,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 signed upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(StorageError::SignatureRejected(format!(
                "S3 rejected signed upload for {}",
                target.path
            )));
        }
        if !status.is_success() {
            return Err(StorageError::UploadFailed(format!(
                "S3 returned status {} for {}",
                status, target.path
            )));
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %target.path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 signed upload successful"
        );

        Ok(())
    }

    async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        validate_path(path)?;
        let start = std::time::Instant::now();
        let location = Path::from(path.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(path.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %path,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        validate_path(path)?;
        let location = Path::from(path.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn remove(&self, paths: &[String]) -> StorageResult<()> {
        for path in paths {
            validate_path(path)?;
        }
        let start = std::time::Instant::now();

        let results = join_all(paths.iter().map(|path| async move {
            let location = Path::from(path.clone());
            let result: ObjectResult<_> = self.store.delete(&location).await;
            match result {
                Ok(_) | Err(ObjectStoreError::NotFound { .. }) => Ok(()),
                Err(e) => Err(format!("{}: {}", path, e)),
            }
        }))
        .await;

        let failures: Vec<String> = results.into_iter().filter_map(Result::err).collect();
        if !failures.is_empty() {
            tracing::error!(
                bucket = %self.bucket,
                failed = failures.len(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 remove failed"
            );
            return Err(StorageError::DeleteFailed(failures.join("; ")));
        }

        tracing::info!(
            bucket = %self.bucket,
            removed = paths.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 remove successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_aws() {
        assert_eq!(
            object_url("photos", "eu-west-1", None, "u/a/p"),
            "https://photos.s3.eu-west-1.amazonaws.com/u/a/p"
        );
    }

    #[test]
    fn test_object_url_custom_endpoint() {
        assert_eq!(
            object_url("photos", "us-east-1", Some("http://localhost:9000/"), "u/a/p"),
            "http://localhost:9000/photos/u/a/p"
        );
    }
}
