//! Reconciliation sweep for photo rows whose upload never landed.
//!
//! The metadata commit happens before the binary upload, so a failed or
//! abandoned upload leaves a row pointing at nothing. Rows older than the
//! grace period whose original blob is missing are deleted, together with
//! any thumbnail that did make it.

use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use toucan_core::{AppError, Config, OpaqueId};
use toucan_db::PhotoStore;
use toucan_storage::BucketStorages;
use uuid::Uuid;

#[derive(Debug, Default, Serialize)]
pub struct ReconcileReport {
    pub checked: usize,
    pub removed: Vec<OpaqueId>,
}

pub struct ReconcileService {
    photos: Arc<dyn PhotoStore>,
    storages: BucketStorages,
    grace: Duration,
}

impl ReconcileService {
    pub fn new(photos: Arc<dyn PhotoStore>, storages: BucketStorages, grace: Duration) -> Self {
        Self {
            photos,
            storages,
            grace,
        }
    }

    pub fn from_config(
        config: &Config,
        photos: Arc<dyn PhotoStore>,
        storages: BucketStorages,
    ) -> Self {
        Self::new(
            photos,
            storages,
            Duration::minutes(config.reconcile_grace_minutes()),
        )
    }

    #[tracing::instrument(skip(self), fields(reconcile.operation = "sweep"))]
    pub async fn sweep(&self, user_id: Uuid) -> Result<ReconcileReport, AppError> {
        let cutoff = Utc::now() - self.grace;
        let candidates = self
            .photos
            .list_user_photos_created_before(user_id, cutoff)
            .await?;

        let mut orphans = Vec::new();
        for photo in &candidates {
            match self.storages.photos.exists(&photo.file_path).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::info!(
                        photo_id = %photo.photo_id,
                        key = %photo.file_path,
                        created_at = %photo.created_at,
                        "Photo row has no blob, scheduling removal"
                    );
                    orphans.push(photo);
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        photo_id = %photo.photo_id,
                        "Could not check blob, leaving row in place"
                    );
                }
            }
        }

        if orphans.is_empty() {
            tracing::info!(checked = candidates.len(), "Reconcile sweep found no orphans");
            return Ok(ReconcileReport {
                checked: candidates.len(),
                removed: Vec::new(),
            });
        }

        let ids: Vec<OpaqueId> = orphans.iter().map(|p| p.photo_id.clone()).collect();
        self.photos.delete_photos(&ids).await?;

        if let Some(thumbnails) = &self.storages.thumbnails {
            let paths: Vec<String> = orphans.iter().map(|p| p.file_path.clone()).collect();
            if let Err(e) = thumbnails.remove(&paths).await {
                tracing::error!(error = %e, "Failed to remove orphaned thumbnails");
            }
        }

        tracing::info!(
            checked = candidates.len(),
            removed = ids.len(),
            "Reconcile sweep completed"
        );

        Ok(ReconcileReport {
            checked: candidates.len(),
            removed: ids,
        })
    }
}
