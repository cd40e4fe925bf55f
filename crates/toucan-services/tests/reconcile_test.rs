mod helpers;

use chrono::Duration as ChronoDuration;
use helpers::{media_item, storages, MemoryStore, RecordingStorage};
use std::time::Duration;
use toucan_services::{ReconcileService, UploadCoordinator, UploadSession};
use uuid::Uuid;

#[tokio::test]
async fn test_sweep_removes_old_rows_without_blobs() {
    let store = MemoryStore::new();
    let photos = RecordingStorage::new("photos");
    let thumbs = RecordingStorage::new("thumbnails");
    let buckets = storages(&photos, Some(&thumbs));
    let owner = Uuid::new_v4();
    let album = store.seed_album(owner, "Trip").await;

    let landed = media_item("landed.jpg");
    let lost = media_item("lost.jpg");
    let fresh = media_item("fresh.jpg");
    let (landed_id, lost_id, fresh_id) = (landed.id.clone(), lost.id.clone(), fresh.id.clone());

    let mut session = UploadSession::new(owner, album.album_id.clone());
    let descriptors = session.stage(vec![landed, lost, fresh]);
    // originals for `lost` and `fresh` never arrive
    photos.fail_uploads_to(&descriptors[1].storage_path);
    photos.fail_uploads_to(&descriptors[2].storage_path);

    let report = UploadCoordinator::new(store.clone(), buckets.clone(), Duration::from_secs(60))
        .upload(session)
        .await
        .unwrap();
    assert_eq!(report.orphaned_ids(), vec![lost_id.clone(), fresh_id.clone()]);

    store.backdate(&landed_id, 120);
    store.backdate(&lost_id, 120);

    let sweep = ReconcileService::new(store.clone(), buckets, ChronoDuration::minutes(60))
        .sweep(owner)
        .await
        .unwrap();

    assert_eq!(sweep.checked, 2);
    assert_eq!(sweep.removed, vec![lost_id]);

    let remaining: Vec<_> = store.photos().into_iter().map(|p| p.photo_id).collect();
    assert_eq!(remaining, vec![landed_id, fresh_id]);
    assert_eq!(thumbs.removed(), vec![descriptors[1].storage_path.clone()]);
}

#[tokio::test]
async fn test_sweep_ignores_other_users() {
    let store = MemoryStore::new();
    let photos = RecordingStorage::new("photos");
    let owner = Uuid::new_v4();
    let album = store.seed_album(owner, "Trip").await;

    let item = media_item("a.jpg");
    let id = item.id.clone();
    let mut session = UploadSession::new(owner, album.album_id.clone());
    let path = session.stage(vec![item])[0].storage_path.clone();
    photos.fail_uploads_to(&path);
    UploadCoordinator::new(store.clone(), storages(&photos, None), Duration::from_secs(60))
        .upload(session)
        .await
        .unwrap();
    store.backdate(&id, 120);

    let sweep = ReconcileService::new(
        store.clone(),
        storages(&photos, None),
        ChronoDuration::minutes(60),
    )
    .sweep(Uuid::new_v4())
    .await
    .unwrap();

    assert_eq!(sweep.checked, 0);
    assert_eq!(store.photos().len(), 1);
}
