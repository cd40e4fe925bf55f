//! Toucan core types
//!
//! Shared configuration, error types, identifiers and domain models used by
//! the storage, processing, database and service crates.

pub mod blurhash;
pub mod config;
pub mod error;
pub mod id;
pub mod models;
pub mod storage_types;

pub use blurhash::{is_valid_blurhash, FALLBACK_BLURHASH};
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use id::{is_valid_id, OpaqueId, ID_ALPHABET, ID_LENGTH};
pub use storage_types::StorageBackend;
