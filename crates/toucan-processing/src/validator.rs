//! Upload allow-list filter applied before files enter the intake pipeline.

use std::path::Path;
use toucan_core::{AppError, Config};

/// Reasons a file is refused at the door
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Content type {content_type} does not match extension '{extension}'")]
    ContentTypeMismatch {
        content_type: String,
        extension: String,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            other => AppError::InvalidInput(other.to_string()),
        }
    }
}

/// Image file validator
pub struct MediaValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

fn extension_of(filename: &str) -> Result<String, ValidationError> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))
}

impl MediaValidator {
    pub fn new(
        max_file_size: usize,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions,
            allowed_content_types,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_upload_size_bytes(),
            config.allowed_extensions().to_vec(),
            config.allowed_content_types().to_vec(),
        )
    }

    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    pub fn validate_extension(&self, filename: &str) -> Result<(), ValidationError> {
        let extension = extension_of(filename)?;
        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }
        Ok(())
    }

    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.to_lowercase();
        if !self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }
        Ok(())
    }

    /// Reject files whose declared MIME type disagrees with their extension
    pub fn validate_extension_content_type_match(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<(), ValidationError> {
        let extension = extension_of(filename)?;
        let normalized = content_type.to_lowercase();

        let expected: &[&str] = match extension.as_str() {
            "jpg" | "jpeg" => &["image/jpeg"],
            "png" => &["image/png"],
            "gif" => &["image/gif"],
            "webp" => &["image/webp"],
            _ => {
                tracing::debug!(
                    extension = %extension,
                    content_type = %content_type,
                    "Unknown extension, skipping Content-Type/extension cross-validation"
                );
                return Ok(());
            }
        };

        if !expected.iter().any(|ct| *ct == normalized) {
            return Err(ValidationError::ContentTypeMismatch {
                content_type: content_type.to_string(),
                extension,
            });
        }
        Ok(())
    }

    pub fn validate_all(
        &self,
        filename: &str,
        content_type: &str,
        file_size: usize,
    ) -> Result<(), ValidationError> {
        self.validate_file_size(file_size)?;
        self.validate_extension(filename)?;
        self.validate_content_type(content_type)?;
        self.validate_extension_content_type_match(filename, content_type)?;
        Ok(())
    }

    /// Guess an image MIME type from a file name
    pub fn content_type_for(filename: &str) -> Option<&'static str> {
        match extension_of(filename).ok()?.as_str() {
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            "gif" => Some("image/gif"),
            "webp" => Some("image/webp"),
            _ => None,
        }
    }
}
