use bytes::Bytes;
use serde::Serialize;
use toucan_core::{Config, OpaqueId};

use crate::compression::{CompressionOptions, OutputFormat};

const ORIGINAL_MAX_SIZE_BYTES: usize = 10 * 1024 * 1024;
const THUMBNAIL_MAX_SIZE_BYTES: usize = 1024 * 1024;
const THUMBNAIL_MAX_DIMENSION: u32 = 600;
const THUMBNAIL_QUALITY: f32 = 0.8;
const PLACEHOLDER_MAX_DIMENSION: u32 = 32;

/// A file handed to intake by the user
#[derive(Debug, Clone)]
pub struct IntakeFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl IntakeFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

/// One binary variant of a media item
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl MediaFile {
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// A processed photo ready to be committed and uploaded
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub id: OpaqueId,
    pub original: MediaFile,
    pub thumbnail: MediaFile,
    pub placeholder_hash: String,
}

/// A file that could not be processed
#[derive(Debug, Clone, Serialize)]
pub struct IntakeFailure {
    /// Position of the file in the submitted batch
    pub index: usize,
    pub file_name: String,
    pub reason: String,
}

/// Outcome of a batch; both lists follow input order
#[derive(Debug, Default)]
pub struct IntakeReport {
    pub items: Vec<MediaItem>,
    pub failures: Vec<IntakeFailure>,
}

impl IntakeReport {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct IntakeOptions {
    pub original: CompressionOptions,
    pub thumbnail: CompressionOptions,
    pub placeholder_max_dimension: u32,
}

impl Default for IntakeOptions {
    fn default() -> Self {
        Self {
            original: CompressionOptions::default().with_max_size_bytes(ORIGINAL_MAX_SIZE_BYTES),
            thumbnail: CompressionOptions::default()
                .with_max_size_bytes(THUMBNAIL_MAX_SIZE_BYTES)
                .with_max_dimension(THUMBNAIL_MAX_DIMENSION)
                .with_format(OutputFormat::WebP)
                .with_quality(THUMBNAIL_QUALITY)
                .strip_exif(),
            placeholder_max_dimension: PLACEHOLDER_MAX_DIMENSION,
        }
    }
}

impl IntakeOptions {
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            original: defaults
                .original
                .with_max_size_bytes(config.original_max_size_bytes())
                .with_max_iterations(config.compression_max_iterations()),
            thumbnail: defaults
                .thumbnail
                .with_max_dimension(config.thumbnail_max_dimension())
                .with_quality(config.thumbnail_quality())
                .with_max_iterations(config.compression_max_iterations()),
            placeholder_max_dimension: config.placeholder_max_dimension(),
        }
    }
}
