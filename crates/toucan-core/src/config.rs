//! Configuration module
//!
//! Settings are read from the process environment (after loading a `.env`
//! file when present) and validated once at start-up.

use std::env;

use crate::storage_types::StorageBackend;

const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const JWT_EXPIRY_HOURS: i64 = 24 * 7;
const SIGNED_UPLOAD_EXPIRY_SECS: u64 = 7200;
const MAX_UPLOAD_SIZE_MB: usize = 50;
const ORIGINAL_MAX_SIZE_MB: usize = 10;
const THUMBNAIL_MAX_DIMENSION: u32 = 600;
const THUMBNAIL_QUALITY: f32 = 0.8;
const PLACEHOLDER_MAX_DIMENSION: u32 = 32;
const COMPRESSION_MAX_ITERATIONS: u32 = 3;
const RECONCILE_GRACE_MINUTES: i64 = 60;
const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Clone, Debug)]
pub struct ToucanConfig {
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    // Storage
    pub storage_backend: StorageBackend,
    pub photos_bucket: String,
    pub thumbnails_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub storage_signing_secret: String,
    pub signed_upload_expiry_secs: u64,
    // Upload filter
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    pub max_upload_size_bytes: usize,
    // Media pipeline
    pub original_max_size_bytes: usize,
    pub thumbnail_max_dimension: u32,
    pub thumbnail_quality: f32,
    pub placeholder_max_dimension: u32,
    pub compression_max_iterations: u32,
    // Reconciliation
    pub reconcile_grace_minutes: i64,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config(pub Box<ToucanConfig>);

fn parse_list(raw: String) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl ToucanConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?;

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let max_upload_size_mb = lookup("MAX_UPLOAD_SIZE_MB")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_UPLOAD_SIZE_MB);
        let original_max_size_mb = lookup("ORIGINAL_MAX_SIZE_MB")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(ORIGINAL_MAX_SIZE_MB);

        Ok(ToucanConfig {
            environment,
            database_url: lookup("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: lookup("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_signing_secret: lookup("STORAGE_SIGNING_SECRET")
                .unwrap_or_else(|| jwt_secret.clone()),
            jwt_secret,
            jwt_expiry_hours: lookup("JWT_EXPIRY_HOURS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(JWT_EXPIRY_HOURS),
            storage_backend,
            photos_bucket: lookup("PHOTOS_BUCKET").unwrap_or_else(|| "photos".to_string()),
            thumbnails_bucket: lookup("THUMBNAILS_BUCKET").filter(|s| !s.trim().is_empty()),
            s3_region: lookup("S3_REGION"),
            s3_endpoint: lookup("S3_ENDPOINT"),
            aws_region: lookup("AWS_REGION"),
            local_storage_path: lookup("LOCAL_STORAGE_PATH"),
            local_storage_base_url: lookup("LOCAL_STORAGE_BASE_URL"),
            signed_upload_expiry_secs: lookup("SIGNED_UPLOAD_EXPIRY_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(SIGNED_UPLOAD_EXPIRY_SECS),
            allowed_extensions: parse_list(
                lookup("ALLOWED_EXTENSIONS").unwrap_or_else(|| "jpg,jpeg,png,webp".to_string()),
            ),
            allowed_content_types: parse_list(
                lookup("ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|| "image/jpeg,image/png,image/webp".to_string()),
            ),
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            original_max_size_bytes: original_max_size_mb * 1024 * 1024,
            thumbnail_max_dimension: lookup("THUMBNAIL_MAX_DIMENSION")
                .and_then(|s| s.parse().ok())
                .unwrap_or(THUMBNAIL_MAX_DIMENSION),
            thumbnail_quality: lookup("THUMBNAIL_QUALITY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(THUMBNAIL_QUALITY),
            placeholder_max_dimension: lookup("PLACEHOLDER_MAX_DIMENSION")
                .and_then(|s| s.parse().ok())
                .unwrap_or(PLACEHOLDER_MAX_DIMENSION),
            compression_max_iterations: lookup("COMPRESSION_MAX_ITERATIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(COMPRESSION_MAX_ITERATIONS),
            reconcile_grace_minutes: lookup("RECONCILE_GRACE_MINUTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(RECONCILE_GRACE_MINUTES),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a PostgreSQL connection string"
            ));
        }

        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least {} characters",
                MIN_JWT_SECRET_LEN
            ));
        }

        if self.jwt_expiry_hours <= 0 {
            return Err(anyhow::anyhow!("JWT_EXPIRY_HOURS must be positive"));
        }

        if self.photos_bucket.trim().is_empty() {
            return Err(anyhow::anyhow!("PHOTOS_BUCKET must not be empty"));
        }

        if self.thumbnails_bucket.as_deref() == Some(self.photos_bucket.as_str()) {
            return Err(anyhow::anyhow!(
                "THUMBNAILS_BUCKET must differ from PHOTOS_BUCKET"
            ));
        }

        if !(0.0..=1.0).contains(&self.thumbnail_quality) {
            return Err(anyhow::anyhow!("THUMBNAIL_QUALITY must be between 0 and 1"));
        }

        if self.thumbnail_max_dimension == 0 || self.placeholder_max_dimension == 0 {
            return Err(anyhow::anyhow!(
                "THUMBNAIL_MAX_DIMENSION and PLACEHOLDER_MAX_DIMENSION must be positive"
            ));
        }

        if self.original_max_size_bytes == 0 || self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "ORIGINAL_MAX_SIZE_MB and MAX_UPLOAD_SIZE_MB must be positive"
            ));
        }

        if self.compression_max_iterations == 0 {
            return Err(anyhow::anyhow!(
                "COMPRESSION_MAX_ITERATIONS must be at least 1"
            ));
        }

        if self.signed_upload_expiry_secs == 0 {
            return Err(anyhow::anyhow!("SIGNED_UPLOAD_EXPIRY_SECS must be positive"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

impl Config {
    fn inner(&self) -> &ToucanConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Config(Box::new(ToucanConfig::from_env()?)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn is_production(&self) -> bool {
        matches!(
            self.inner().environment.to_lowercase().as_str(),
            "production" | "prod"
        )
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().jwt_secret
    }

    pub fn jwt_expiry_hours(&self) -> i64 {
        self.inner().jwt_expiry_hours
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn photos_bucket(&self) -> &str {
        &self.inner().photos_bucket
    }

    pub fn thumbnails_bucket(&self) -> Option<&str> {
        self.inner().thumbnails_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn storage_signing_secret(&self) -> &str {
        &self.inner().storage_signing_secret
    }

    pub fn signed_upload_expiry_secs(&self) -> u64 {
        self.inner().signed_upload_expiry_secs
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.inner().allowed_extensions
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.inner().allowed_content_types
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.inner().max_upload_size_bytes
    }

    pub fn original_max_size_bytes(&self) -> usize {
        self.inner().original_max_size_bytes
    }

    pub fn thumbnail_max_dimension(&self) -> u32 {
        self.inner().thumbnail_max_dimension
    }

    pub fn thumbnail_quality(&self) -> f32 {
        self.inner().thumbnail_quality
    }

    pub fn placeholder_max_dimension(&self) -> u32 {
        self.inner().placeholder_max_dimension
    }

    pub fn compression_max_iterations(&self) -> u32 {
        self.inner().compression_max_iterations
    }

    pub fn reconcile_grace_minutes(&self) -> i64 {
        self.inner().reconcile_grace_minutes
    }
}
