use toucan_core::AppError;

use crate::blurhash::BlurhashError;

/// Errors raised while deriving media variants
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Invalid compression options: {0}")]
    InvalidOptions(String),

    #[error("Image worker failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Blurhash(#[from] BlurhashError),
}

impl From<tokio::task::JoinError> for ProcessingError {
    fn from(err: tokio::task::JoinError) -> Self {
        ProcessingError::Worker(err.to_string())
    }
}

impl From<image::ImageError> for ProcessingError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Encoding(e) => ProcessingError::Encode(e.to_string()),
            other => ProcessingError::Decode(other.to_string()),
        }
    }
}

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        AppError::ImageProcessing(err.to_string())
    }
}
