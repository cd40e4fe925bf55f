use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use toucan_core::{AppError, Config, OpaqueId};
use toucan_db::{AlbumStore, PhotoStore};
use toucan_processing::{
    process_batch, IntakeFailure, IntakeFile, IntakeOptions, MediaValidator,
};
use toucan_storage::BucketStorages;
use uuid::Uuid;

use super::coordinator::{UploadCoordinator, UploadReport};
use super::session::UploadSession;

/// Everything that happened to one batch of selected files
#[derive(Debug, Default, Serialize)]
pub struct WorkflowReport {
    /// Files refused by the allow-list before processing
    pub rejected: Vec<IntakeFailure>,
    /// Files that could not be compressed or hashed
    pub intake_failures: Vec<IntakeFailure>,
    pub upload: UploadReport,
}

impl WorkflowReport {
    pub fn failed_count(&self) -> usize {
        self.rejected.len() + self.intake_failures.len() + self.upload.orphaned_ids().len()
    }
}

/// Album check, allow-list, intake, commit and upload in one call
pub struct UploadWorkflow {
    albums: Arc<dyn AlbumStore>,
    validator: MediaValidator,
    intake: IntakeOptions,
    coordinator: UploadCoordinator,
}

impl UploadWorkflow {
    pub fn new(
        albums: Arc<dyn AlbumStore>,
        validator: MediaValidator,
        intake: IntakeOptions,
        coordinator: UploadCoordinator,
    ) -> Self {
        Self {
            albums,
            validator,
            intake,
            coordinator,
        }
    }

    pub fn from_config(
        config: &Config,
        albums: Arc<dyn AlbumStore>,
        photos: Arc<dyn PhotoStore>,
        storages: BucketStorages,
    ) -> Self {
        let coordinator = UploadCoordinator::new(
            photos,
            storages,
            Duration::from_secs(config.signed_upload_expiry_secs()),
        );
        Self::new(
            albums,
            MediaValidator::from_config(config),
            IntakeOptions::from_config(config),
            coordinator,
        )
    }

    #[tracing::instrument(skip(self, files), fields(album_id = %album_id, files = files.len()))]
    pub async fn upload(
        &self,
        user_id: Uuid,
        album_id: &OpaqueId,
        files: Vec<IntakeFile>,
    ) -> Result<WorkflowReport, AppError> {
        self.albums
            .get_album(user_id, album_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Album {}", album_id)))?;

        let mut rejected = Vec::new();
        let mut accepted = Vec::with_capacity(files.len());
        let mut accepted_indices = Vec::with_capacity(files.len());

        for (index, file) in files.into_iter().enumerate() {
            match self
                .validator
                .validate_all(&file.name, &file.content_type, file.data.len())
            {
                Ok(()) => {
                    accepted_indices.push(index);
                    accepted.push(file);
                }
                Err(e) => {
                    tracing::warn!(index, file_name = %file.name, error = %e, "File rejected");
                    rejected.push(IntakeFailure {
                        index,
                        file_name: file.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let intake = process_batch(accepted, &self.intake).await;

        // report positions in the caller's list, not the filtered one
        let intake_failures = intake
            .failures
            .into_iter()
            .map(|mut failure| {
                if let Some(&original) = accepted_indices.get(failure.index) {
                    failure.index = original;
                }
                failure
            })
            .collect();

        let mut session = UploadSession::new(user_id, album_id.clone());
        session.stage(intake.items);
        let upload = self.coordinator.upload(session).await?;

        Ok(WorkflowReport {
            rejected,
            intake_failures,
            upload,
        })
    }
}
