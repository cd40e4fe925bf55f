//! Toucan Services Layer
//!
//! Orchestration over the store, storage and processing crates: accounts and
//! sessions, galleries, the two-phase upload workflow, deletion and the
//! orphan reconciliation sweep. Front ends (the CLI today) depend on this
//! crate only.

pub mod auth;
pub mod deletion;
pub mod gallery;
pub mod reconcile;
pub mod upload;

pub use auth::{AuthService, Credentials, Session, SessionClaims};
pub use deletion::{DeletionReport, DeletionService};
pub use gallery::{AlbumView, GalleryService};
pub use reconcile::{ReconcileReport, ReconcileService};
pub use upload::{
    MediaVariant, UploadCoordinator, UploadFailure, UploadFailureReason, UploadReport,
    UploadSession, UploadWorkflow, WorkflowReport,
};

pub use toucan_processing::{IntakeFile, IntakeOptions, MediaValidator};
pub use toucan_storage::{create_bucket_storages, BucketStorages, Storage};
