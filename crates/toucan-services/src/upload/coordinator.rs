use bytes::Bytes;
use futures::future::join_all;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use toucan_core::models::{SignedTarget, UploadDescriptor};
use toucan_core::{AppError, OpaqueId};
use toucan_db::PhotoStore;
use toucan_storage::{BucketStorages, Storage};

use super::session::UploadSession;

/// Which binary of a photo a target or failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaVariant {
    Original,
    Thumbnail,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
pub enum UploadFailureReason {
    #[error("Could not obtain a signed upload target: {0}")]
    TargetUnavailable(String),

    #[error("No signed upload target matched this photo")]
    NoMatchingTarget,

    #[error("Upload failed: {0}")]
    Transfer(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadFailure {
    pub photo_id: OpaqueId,
    pub file_name: String,
    pub variant: MediaVariant,
    pub reason: UploadFailureReason,
}

/// Outcome of phase two; the metadata rows of every listed id exist
#[derive(Debug, Default, Serialize)]
pub struct UploadReport {
    pub committed: usize,
    pub uploaded: Vec<OpaqueId>,
    pub failures: Vec<UploadFailure>,
}

impl UploadReport {
    /// Committed photos with at least one missing blob
    pub fn orphaned_ids(&self) -> Vec<OpaqueId> {
        let mut seen = HashSet::new();
        self.failures
            .iter()
            .filter(|f| seen.insert(f.photo_id.clone()))
            .map(|f| f.photo_id.clone())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

struct Transfer<'a> {
    descriptor: &'a UploadDescriptor,
    variant: MediaVariant,
    storage: Arc<dyn Storage>,
    target: SignedTarget,
    content_type: String,
    data: Bytes,
}

#[derive(Clone)]
pub struct UploadCoordinator {
    photos: Arc<dyn PhotoStore>,
    storages: BucketStorages,
    target_ttl: Duration,
}

impl UploadCoordinator {
    pub fn new(photos: Arc<dyn PhotoStore>, storages: BucketStorages, target_ttl: Duration) -> Self {
        Self {
            photos,
            storages,
            target_ttl,
        }
    }

    fn destinations(&self) -> Vec<(MediaVariant, Arc<dyn Storage>)> {
        let mut destinations = vec![(MediaVariant::Original, self.storages.photos.clone())];
        if let Some(thumbnails) = &self.storages.thumbnails {
            destinations.push((MediaVariant::Thumbnail, thumbnails.clone()));
        }
        destinations
    }

    /// Commit the session's metadata, then upload every payload
    ///
    /// A descriptor with a malformed placeholder hash rejects the whole batch
    /// with `InvalidInput` before anything is written. A rejected commit
    /// returns the store error and nothing is uploaded.
    /// After a successful commit the call always returns a report; per-item
    /// failures are collected in it.
    #[tracing::instrument(
        skip(self, session),
        fields(owner_id = %session.owner_id(), album_id = %session.album_id(), count = session.len())
    )]
    pub async fn upload(&self, session: UploadSession) -> Result<UploadReport, AppError> {
        if session.is_empty() {
            return Ok(UploadReport::default());
        }
        let start = Instant::now();
        let descriptors = session.descriptors();

        if let Err(e) = descriptors.iter().try_for_each(UploadDescriptor::validate) {
            tracing::error!(error = %e, "Batch rejected before metadata commit");
            return Err(e);
        }

        if let Err(e) = self.photos.insert_photos(descriptors).await {
            tracing::error!(
                error = %e,
                count = descriptors.len(),
                "Metadata commit rejected, no uploads attempted"
            );
            return Err(e);
        }

        let mut failures = Vec::new();
        let mut transfers = Vec::new();

        let destinations = self.destinations();
        let requests = destinations.iter().flat_map(|(variant, storage)| {
            descriptors.iter().map(move |descriptor| async move {
                let result = storage
                    .create_signed_upload_target(&descriptor.storage_path, self.target_ttl)
                    .await;
                (*variant, descriptor, result)
            })
        });
        let responses = join_all(requests).await;

        let mut targets: HashMap<MediaVariant, Vec<SignedTarget>> = HashMap::new();
        let mut unavailable = HashSet::new();
        for (variant, descriptor, result) in responses {
            match result {
                Ok(target) => targets.entry(variant).or_default().push(target),
                Err(e) => {
                    tracing::warn!(
                        photo_id = %descriptor.id,
                        variant = ?variant,
                        error = %e,
                        "Signed upload target request failed"
                    );
                    unavailable.insert((variant, descriptor.id.clone()));
                    failures.push(UploadFailure {
                        photo_id: descriptor.id.clone(),
                        file_name: descriptor.display_name.clone(),
                        variant,
                        reason: UploadFailureReason::TargetUnavailable(e.to_string()),
                    });
                }
            }
        }

        for (variant, storage) in &destinations {
            let mut issued = targets.remove(variant).unwrap_or_default();

            for descriptor in descriptors {
                if unavailable.contains(&(*variant, descriptor.id.clone())) {
                    continue;
                }
                let matched = issued
                    .iter()
                    .position(|t| t.matches(&descriptor.id))
                    .map(|pos| issued.swap_remove(pos));
                let (Some(target), Some(item)) = (matched, session.get(&descriptor.id)) else {
                    failures.push(UploadFailure {
                        photo_id: descriptor.id.clone(),
                        file_name: descriptor.display_name.clone(),
                        variant: *variant,
                        reason: UploadFailureReason::NoMatchingTarget,
                    });
                    continue;
                };

                let file = match variant {
                    MediaVariant::Original => &item.original,
                    MediaVariant::Thumbnail => &item.thumbnail,
                };
                transfers.push(Transfer {
                    descriptor,
                    variant: *variant,
                    storage: storage.clone(),
                    target,
                    content_type: file.content_type.clone(),
                    data: file.data.clone(),
                });
            }

            for target in issued {
                tracing::warn!(
                    path = %target.path,
                    variant = ?variant,
                    "Signed target matched no pending photo"
                );
            }
        }

        let results = join_all(transfers.into_iter().map(|transfer| async move {
            let result = transfer
                .storage
                .upload_to_signed_target(&transfer.target, &transfer.content_type, transfer.data)
                .await;
            (transfer.descriptor, transfer.variant, result)
        }))
        .await;

        for (descriptor, variant, result) in results {
            if let Err(e) = result {
                tracing::warn!(
                    photo_id = %descriptor.id,
                    variant = ?variant,
                    error = %e,
                    "Photo upload failed"
                );
                failures.push(UploadFailure {
                    photo_id: descriptor.id.clone(),
                    file_name: descriptor.display_name.clone(),
                    variant,
                    reason: UploadFailureReason::Transfer(e.to_string()),
                });
            }
        }

        let order: HashMap<&OpaqueId, usize> = descriptors
            .iter()
            .enumerate()
            .map(|(index, d)| (&d.id, index))
            .collect();
        failures.sort_by_key(|f| (order.get(&f.photo_id).copied(), f.variant));

        let failed: HashSet<&OpaqueId> = failures.iter().map(|f| &f.photo_id).collect();
        let uploaded: Vec<OpaqueId> = descriptors
            .iter()
            .filter(|d| !failed.contains(&d.id))
            .map(|d| d.id.clone())
            .collect();

        tracing::info!(
            committed = descriptors.len(),
            uploaded = uploaded.len(),
            failed = failed.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload batch complete"
        );

        Ok(UploadReport {
            committed: descriptors.len(),
            uploaded,
            failures,
        })
    }
}
