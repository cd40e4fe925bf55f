//! Owner-scoped photo deletion.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use toucan_core::{AppError, OpaqueId};
use toucan_db::PhotoStore;
use toucan_storage::{BucketStorages, Storage};
use uuid::Uuid;

#[derive(Debug, Default, Serialize)]
pub struct DeletionReport {
    pub deleted: Vec<OpaqueId>,
    /// Requested ids the user does not own (or that do not exist)
    pub skipped: Vec<OpaqueId>,
}

pub struct DeletionService {
    photos: Arc<dyn PhotoStore>,
    storages: BucketStorages,
}

async fn remove_blobs(storage: &Arc<dyn Storage>, paths: &[String]) {
    if let Err(e) = storage.remove(paths).await {
        tracing::error!(
            error = %e,
            bucket = %storage.bucket(),
            count = paths.len(),
            "Failed to remove photo blobs, rows already deleted"
        );
    }
}

impl DeletionService {
    pub fn new(photos: Arc<dyn PhotoStore>, storages: BucketStorages) -> Self {
        Self { photos, storages }
    }

    /// Delete the photos in `photo_ids` that `user_id` owns; others are skipped
    #[tracing::instrument(skip(self, photo_ids), fields(requested = photo_ids.len()))]
    pub async fn delete_photos(
        &self,
        user_id: Uuid,
        photo_ids: &[OpaqueId],
    ) -> Result<DeletionReport, AppError> {
        let requested: HashSet<&OpaqueId> = photo_ids.iter().collect();
        let owned: Vec<_> = self
            .photos
            .list_user_photos(user_id)
            .await?
            .into_iter()
            .filter(|photo| requested.contains(&photo.photo_id))
            .collect();

        let owned_ids: HashSet<&OpaqueId> = owned.iter().map(|p| &p.photo_id).collect();
        let skipped: Vec<OpaqueId> = photo_ids
            .iter()
            .filter(|id| !owned_ids.contains(id))
            .cloned()
            .collect();

        if owned.is_empty() {
            tracing::info!(skipped = skipped.len(), "No owned photos to delete");
            return Ok(DeletionReport {
                deleted: Vec::new(),
                skipped,
            });
        }

        let ids: Vec<OpaqueId> = owned.iter().map(|p| p.photo_id.clone()).collect();
        let rows = self.photos.delete_photos(&ids).await?;

        let paths: Vec<String> = owned
            .iter()
            .map(|p| p.file_path.clone())
            .filter(|path| !path.trim().is_empty())
            .collect();
        remove_blobs(&self.storages.photos, &paths).await;
        if let Some(thumbnails) = &self.storages.thumbnails {
            remove_blobs(thumbnails, &paths).await;
        }

        tracing::info!(
            deleted = ids.len(),
            rows,
            skipped = skipped.len(),
            "Photos deleted"
        );

        Ok(DeletionReport {
            deleted: ids,
            skipped,
        })
    }
}
