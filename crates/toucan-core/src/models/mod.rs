//! Domain models
//!
//! Rows persisted by the metadata store and the value types exchanged between
//! the intake pipeline, the upload coordinator and the storage backends.

pub mod album;
pub mod photo;
pub mod upload;
pub mod user;

pub use album::{Album, NewAlbum};
pub use photo::{Photo, PhotoView, PLACEHOLDER_IMAGE_URL};
pub use upload::{storage_path, SignedTarget, UploadDescriptor};
pub use user::User;
