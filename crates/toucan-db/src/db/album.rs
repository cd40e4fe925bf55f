use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use toucan_core::models::{Album, NewAlbum};
use toucan_core::{AppError, OpaqueId};
use uuid::Uuid;

use super::stores::AlbumStore;

const ALBUM_COLUMNS: &str = "album_id, user_id, name, is_public, created_at, edited_at";

#[derive(Clone)]
pub struct AlbumRepository {
    pool: PgPool,
}

impl AlbumRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlbumStore for AlbumRepository {
    #[tracing::instrument(skip(self, album), fields(db.table = "albums", db.operation = "insert", album_id = %album.album_id))]
    async fn create_album(&self, album: NewAlbum) -> Result<Album, AppError> {
        let album = sqlx::query_as::<Postgres, Album>(&format!(
            r#"
            INSERT INTO albums (album_id, user_id, name, is_public)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            ALBUM_COLUMNS
        ))
        .bind(album.album_id.as_str())
        .bind(album.user_id)
        .bind(&album.name)
        .bind(album.is_public)
        .fetch_one(&self.pool)
        .await?;

        Ok(album)
    }

    #[tracing::instrument(skip(self), fields(db.table = "albums", db.operation = "select"))]
    async fn list_albums(&self, user_id: Uuid) -> Result<Vec<Album>, AppError> {
        let albums = sqlx::query_as::<Postgres, Album>(&format!(
            "SELECT {} FROM albums WHERE user_id = $1 ORDER BY created_at DESC, album_id",
            ALBUM_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(albums)
    }

    #[tracing::instrument(skip(self), fields(db.table = "albums", db.operation = "select", db.record_id = %album_id))]
    async fn get_album(
        &self,
        user_id: Uuid,
        album_id: &OpaqueId,
    ) -> Result<Option<Album>, AppError> {
        let album = sqlx::query_as::<Postgres, Album>(&format!(
            "SELECT {} FROM albums WHERE user_id = $1 AND album_id = $2",
            ALBUM_COLUMNS
        ))
        .bind(user_id)
        .bind(album_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(album)
    }
}
