//! Toucan Storage Library
//!
//! Bucket-scoped blob storage with signed upload targets. Each [`Storage`]
//! instance is bound to one bucket (`photos`, `thumbnails`, ...).
//!
//! # Path format
//!
//! Object paths are `{owner_id}/{album_id}/{photo_id}`. Paths must not be
//! empty, contain `..` or a backslash, or start with `/`; every backend checks
//! this through the `keys` module before touching the store.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod signing;
pub mod traits;

pub use factory::{create_bucket_storages, create_storage, BucketStorages};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use signing::UploadTokenSigner;
pub use toucan_core::StorageBackend;
pub use traits::{Storage, StorageError, StorageResult};
