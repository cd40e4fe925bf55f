//! Album management and gallery views.

use serde::Serialize;
use std::sync::Arc;
use toucan_core::models::{Album, NewAlbum, PhotoView};
use toucan_core::{is_valid_blurhash, AppError, OpaqueId};
use toucan_db::{AlbumStore, PhotoStore};
use toucan_storage::Storage;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct AlbumView {
    pub album: Album,
    pub photos: Vec<PhotoView>,
}

pub struct GalleryService {
    albums: Arc<dyn AlbumStore>,
    photos: Arc<dyn PhotoStore>,
    storage: Arc<dyn Storage>,
}

impl GalleryService {
    pub fn new(
        albums: Arc<dyn AlbumStore>,
        photos: Arc<dyn PhotoStore>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            albums,
            photos,
            storage,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_album(
        &self,
        user_id: Uuid,
        name: &str,
        is_public: bool,
    ) -> Result<Album, AppError> {
        let album = self
            .albums
            .create_album(NewAlbum::new(user_id, name, is_public)?)
            .await?;
        tracing::info!(album_id = %album.album_id, "Album created");
        Ok(album)
    }

    pub async fn list_albums(&self, user_id: Uuid) -> Result<Vec<Album>, AppError> {
        self.albums.list_albums(user_id).await
    }

    /// Album with its photos; other users' albums are not found
    #[tracing::instrument(skip(self))]
    pub async fn album_view(&self, user_id: Uuid, album_id: &str) -> Result<AlbumView, AppError> {
        let album_id = OpaqueId::parse(album_id)?;
        let album = self
            .albums
            .get_album(user_id, &album_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Album {}", album_id)))?;

        let photos = self.photos.list_album_photos(&album_id).await?;
        Ok(AlbumView {
            album,
            photos: self.present(photos),
        })
    }

    /// Every photo across the user's albums, newest first
    pub async fn all_photos(&self, user_id: Uuid) -> Result<Vec<PhotoView>, AppError> {
        let photos = self.photos.list_user_photos(user_id).await?;
        Ok(self.present(photos))
    }

    fn present(&self, photos: Vec<toucan_core::models::Photo>) -> Vec<PhotoView> {
        photos
            .into_iter()
            .map(|photo| {
                if !is_valid_blurhash(&photo.blurhash) {
                    tracing::warn!(
                        photo_id = %photo.photo_id,
                        "Stored placeholder hash is malformed"
                    );
                }
                PhotoView::from_photo(photo, |path| self.storage.public_url(path))
            })
            .collect()
    }
}
