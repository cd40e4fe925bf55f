use async_trait::async_trait;
use chrono::{DateTime, Utc};
use toucan_core::models::{Album, NewAlbum, Photo, UploadDescriptor, User};
use toucan_core::{AppError, OpaqueId};
use uuid::Uuid;

#[async_trait]
pub trait AlbumStore: Send + Sync {
    async fn create_album(&self, album: NewAlbum) -> Result<Album, AppError>;

    /// Albums owned by `user_id`, newest first
    async fn list_albums(&self, user_id: Uuid) -> Result<Vec<Album>, AppError>;

    /// Owner-scoped lookup; another user's album is `None`
    async fn get_album(&self, user_id: Uuid, album_id: &OpaqueId)
        -> Result<Option<Album>, AppError>;
}

#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Insert a whole batch; either every row is written or none is
    async fn insert_photos(&self, descriptors: &[UploadDescriptor])
        -> Result<Vec<Photo>, AppError>;

    async fn list_album_photos(&self, album_id: &OpaqueId) -> Result<Vec<Photo>, AppError>;

    /// Photos across every album owned by `user_id`
    async fn list_user_photos(&self, user_id: Uuid) -> Result<Vec<Photo>, AppError>;

    async fn list_user_photos_created_before(
        &self,
        user_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Photo>, AppError>;

    /// Returns the number of rows removed
    async fn delete_photos(&self, photo_ids: &[OpaqueId]) -> Result<u64, AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}
