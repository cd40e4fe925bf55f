use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use toucan_core::models::{Photo, UploadDescriptor};
use toucan_core::{AppError, OpaqueId};
use uuid::Uuid;

use super::stores::PhotoStore;
use super::transaction::TransactionGuard;

const PHOTO_COLUMNS: &str = "p.photo_id, p.album_id, p.file_path, p.name, p.blurhash, p.created_at";

#[derive(Clone)]
pub struct PhotoRepository {
    pool: PgPool,
}

impl PhotoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PhotoStore for PhotoRepository {
    #[tracing::instrument(skip(self, descriptors), fields(db.table = "photos", db.operation = "insert", count = descriptors.len()))]
    async fn insert_photos(
        &self,
        descriptors: &[UploadDescriptor],
    ) -> Result<Vec<Photo>, AppError> {
        if descriptors.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = TransactionGuard::begin(&self.pool).await?;
        let mut photos = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let photo = sqlx::query_as::<Postgres, Photo>(
                r#"
                INSERT INTO photos AS p (photo_id, album_id, file_path, name, blurhash)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING p.photo_id, p.album_id, p.file_path, p.name, p.blurhash, p.created_at
                "#,
            )
            .bind(descriptor.id.as_str())
            .bind(descriptor.parent_id.as_str())
            .bind(&descriptor.storage_path)
            .bind(&descriptor.display_name)
            .bind(&descriptor.placeholder_hash)
            .fetch_one(tx.conn()?)
            .await;

            match photo {
                Ok(photo) => photos.push(photo),
                Err(e) => {
                    tracing::warn!(
                        photo_id = %descriptor.id,
                        error = %e,
                        "Photo batch insert rejected, rolling back"
                    );
                    tx.rollback().await?;
                    return Err(e.into());
                }
            }
        }

        tx.commit().await?;

        tracing::info!(count = photos.len(), "Photo batch committed");
        Ok(photos)
    }

    #[tracing::instrument(skip(self), fields(db.table = "photos", db.operation = "select"))]
    async fn list_album_photos(&self, album_id: &OpaqueId) -> Result<Vec<Photo>, AppError> {
        let photos = sqlx::query_as::<Postgres, Photo>(&format!(
            "SELECT {} FROM photos p WHERE p.album_id = $1 ORDER BY p.created_at, p.photo_id",
            PHOTO_COLUMNS
        ))
        .bind(album_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(photos)
    }

    #[tracing::instrument(skip(self), fields(db.table = "photos", db.operation = "select"))]
    async fn list_user_photos(&self, user_id: Uuid) -> Result<Vec<Photo>, AppError> {
        let photos = sqlx::query_as::<Postgres, Photo>(&format!(
            r#"
            SELECT {} FROM photos p
            JOIN albums a ON a.album_id = p.album_id
            WHERE a.user_id = $1
            ORDER BY p.created_at DESC, p.photo_id
            "#,
            PHOTO_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(photos)
    }

    #[tracing::instrument(skip(self), fields(db.table = "photos", db.operation = "select"))]
    async fn list_user_photos_created_before(
        &self,
        user_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Photo>, AppError> {
        let photos = sqlx::query_as::<Postgres, Photo>(&format!(
            r#"
            SELECT {} FROM photos p
            JOIN albums a ON a.album_id = p.album_id
            WHERE a.user_id = $1 AND p.created_at < $2
            ORDER BY p.created_at, p.photo_id
            "#,
            PHOTO_COLUMNS
        ))
        .bind(user_id)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(photos)
    }

    #[tracing::instrument(skip(self, photo_ids), fields(db.table = "photos", db.operation = "delete", count = photo_ids.len()))]
    async fn delete_photos(&self, photo_ids: &[OpaqueId]) -> Result<u64, AppError> {
        if photo_ids.is_empty() {
            return Ok(0);
        }
        let ids: Vec<String> = photo_ids.iter().map(|id| id.as_str().to_string()).collect();

        let rows_affected = sqlx::query("DELETE FROM photos WHERE photo_id = ANY($1)")
            .bind(&ids)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}
