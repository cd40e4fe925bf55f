//! Intake: turn picked files into upload-ready media items.
//!
//! Every file is processed independently and concurrently. A file that fails
//! to decode or encode is reported and skipped; it never aborts the batch.

mod pipeline;
mod types;

pub use pipeline::{process_batch, process_file};
pub use types::{IntakeFailure, IntakeFile, IntakeOptions, IntakeReport, MediaFile, MediaItem};
