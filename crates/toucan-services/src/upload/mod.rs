//! Two-phase photo upload.
//!
//! Phase one commits every descriptor of a batch to the metadata store in a
//! single call. Phase two requests one signed target per item, matches each
//! target back to its item by id, and sends the payloads directly to storage.

mod coordinator;
mod session;
mod workflow;

pub use coordinator::{
    MediaVariant, UploadCoordinator, UploadFailure, UploadFailureReason, UploadReport,
};
pub use session::UploadSession;
pub use workflow::{UploadWorkflow, WorkflowReport};
