//! Toucan media processing
//!
//! Turns user-selected image files into upload-ready media items: a
//! size-capped original, a downscaled thumbnail and a BlurHash placeholder.

pub mod blurhash;
pub mod compression;
pub mod error;
pub mod intake;
pub mod orientation;
pub mod validator;

pub use compression::{compress, CompressedImage, CompressionOptions, OutputFormat};
pub use error::ProcessingError;
pub use intake::{
    process_batch, process_file, IntakeFailure, IntakeFile, IntakeOptions, IntakeReport,
    MediaFile, MediaItem,
};
pub use validator::{MediaValidator, ValidationError};
