use bytes::Bytes;
use futures::stream::{FuturesUnordered, StreamExt};
use std::path::Path;
use toucan_core::OpaqueId;

use super::types::{IntakeFailure, IntakeFile, IntakeOptions, IntakeReport, MediaFile, MediaItem};
use crate::blurhash::{self, PLACEHOLDER_COMPONENTS_X, PLACEHOLDER_COMPONENTS_Y};
use crate::compression::compress;
use crate::error::ProcessingError;
use crate::orientation;

fn thumbnail_name(name: &str, extension: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    format!("{}_thumb.{}", stem, extension)
}

async fn placeholder(data: Bytes, max_dimension: u32) -> Result<String, ProcessingError> {
    tokio::task::spawn_blocking(move || -> Result<String, ProcessingError> {
        let img = image::load_from_memory(&data)?;
        let img = orientation::apply_exif_orientation(img, &data);
        let hash = blurhash::encode_image(
            &img,
            max_dimension,
            PLACEHOLDER_COMPONENTS_X,
            PLACEHOLDER_COMPONENTS_Y,
        )?;
        Ok(hash)
    })
    .await?
}

/// Derive the original, thumbnail and placeholder for one file
#[tracing::instrument(skip(file, options), fields(file_name = %file.name, size_bytes = file.data.len()))]
pub async fn process_file(
    file: IntakeFile,
    options: &IntakeOptions,
) -> Result<MediaItem, ProcessingError> {
    let start = std::time::Instant::now();

    let (original, thumbnail, placeholder_hash) = tokio::try_join!(
        compress(file.data.clone(), options.original.clone()),
        compress(file.data.clone(), options.thumbnail.clone()),
        placeholder(file.data.clone(), options.placeholder_max_dimension),
    )?;

    let thumbnail_format = thumbnail
        .format
        .ok_or_else(|| ProcessingError::Encode("Thumbnail was not re-encoded".to_string()))?;

    let item = MediaItem {
        id: OpaqueId::generate(),
        original: MediaFile {
            name: file.name.clone(),
            content_type: original.content_type(&file.content_type).to_string(),
            data: original.data,
        },
        thumbnail: MediaFile {
            name: thumbnail_name(&file.name, thumbnail_format.extension()),
            content_type: thumbnail_format.to_mime_type().to_string(),
            data: thumbnail.data,
        },
        placeholder_hash,
    };

    tracing::debug!(
        photo_id = %item.id,
        original_bytes = item.original.size_bytes(),
        thumbnail_bytes = item.thumbnail.size_bytes(),
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "File processed"
    );

    Ok(item)
}

/// Process every file concurrently; failures are collected, not propagated
pub async fn process_batch(files: Vec<IntakeFile>, options: &IntakeOptions) -> IntakeReport {
    let total = files.len();
    let start = std::time::Instant::now();

    let mut pending: FuturesUnordered<_> = files
        .into_iter()
        .enumerate()
        .map(|(index, file)| async move {
            let file_name = file.name.clone();
            (index, file_name, process_file(file, options).await)
        })
        .collect();

    let mut items = Vec::with_capacity(total);
    let mut failures = Vec::new();

    while let Some((index, file_name, result)) = pending.next().await {
        match result {
            Ok(item) => items.push((index, item)),
            Err(e) => {
                tracing::warn!(
                    index,
                    file_name = %file_name,
                    error = %e,
                    "Skipping file that failed processing"
                );
                failures.push(IntakeFailure {
                    index,
                    file_name,
                    reason: e.to_string(),
                });
            }
        }
    }

    items.sort_by_key(|(index, _)| *index);
    failures.sort_by_key(|f| f.index);

    tracing::info!(
        total,
        processed = items.len(),
        failed = failures.len(),
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Intake batch complete"
    );

    IntakeReport {
        items: items.into_iter().map(|(_, item)| item).collect(),
        failures,
    }
}
