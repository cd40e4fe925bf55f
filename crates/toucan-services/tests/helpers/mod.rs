//! Test helpers: in-memory stores and a recording storage fake.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use toucan_core::models::{Album, NewAlbum, Photo, SignedTarget, UploadDescriptor, User};
use toucan_core::{AppError, OpaqueId, StorageBackend};
use toucan_db::{AlbumStore, PhotoStore, UserStore};
use toucan_processing::{MediaFile, MediaItem};
use toucan_storage::{BucketStorages, Storage, StorageError, StorageResult};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-at-least-32-characters";

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    albums: Vec<Album>,
    photos: Vec<Photo>,
    reject_inserts: bool,
    insert_calls: usize,
}

/// One object implementing every store trait over shared in-memory tables
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reject_inserts(&self) {
        self.state.lock().unwrap().reject_inserts = true;
    }

    pub fn insert_calls(&self) -> usize {
        self.state.lock().unwrap().insert_calls
    }

    pub fn photos(&self) -> Vec<Photo> {
        self.state.lock().unwrap().photos.clone()
    }

    /// Shift a photo's creation time into the past
    pub fn backdate(&self, photo_id: &OpaqueId, minutes: i64) {
        let mut state = self.state.lock().unwrap();
        for photo in state.photos.iter_mut().filter(|p| &p.photo_id == photo_id) {
            photo.created_at = photo.created_at - ChronoDuration::minutes(minutes);
        }
    }

    pub async fn seed_album(&self, user_id: Uuid, name: &str) -> Album {
        self.create_album(NewAlbum::new(user_id, name, false).unwrap())
            .await
            .unwrap()
    }
}

#[async_trait]
impl AlbumStore for MemoryStore {
    async fn create_album(&self, album: NewAlbum) -> Result<Album, AppError> {
        let now = Utc::now();
        let album = Album {
            album_id: album.album_id,
            user_id: album.user_id,
            name: album.name,
            is_public: album.is_public,
            created_at: now,
            edited_at: now,
        };
        self.state.lock().unwrap().albums.push(album.clone());
        Ok(album)
    }

    async fn list_albums(&self, user_id: Uuid) -> Result<Vec<Album>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .albums
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_album(
        &self,
        user_id: Uuid,
        album_id: &OpaqueId,
    ) -> Result<Option<Album>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .albums
            .iter()
            .find(|a| a.user_id == user_id && &a.album_id == album_id)
            .cloned())
    }
}

#[async_trait]
impl PhotoStore for MemoryStore {
    async fn insert_photos(
        &self,
        descriptors: &[UploadDescriptor],
    ) -> Result<Vec<Photo>, AppError> {
        let mut state = self.state.lock().unwrap();
        state.insert_calls += 1;
        if state.reject_inserts {
            return Err(AppError::Conflict("photos_pkey violated".to_string()));
        }

        let mut seen: HashSet<&OpaqueId> = state.photos.iter().map(|p| &p.photo_id).collect();
        for d in descriptors {
            if !seen.insert(&d.id) {
                return Err(AppError::Conflict(format!("duplicate photo id {}", d.id)));
            }
        }

        let now = Utc::now();
        let rows: Vec<Photo> = descriptors
            .iter()
            .map(|d| Photo {
                photo_id: d.id.clone(),
                album_id: d.parent_id.clone(),
                file_path: d.storage_path.clone(),
                name: d.display_name.clone(),
                blurhash: d.placeholder_hash.clone(),
                created_at: now,
            })
            .collect();
        state.photos.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn list_album_photos(&self, album_id: &OpaqueId) -> Result<Vec<Photo>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .photos
            .iter()
            .filter(|p| &p.album_id == album_id)
            .cloned()
            .collect())
    }

    async fn list_user_photos(&self, user_id: Uuid) -> Result<Vec<Photo>, AppError> {
        let state = self.state.lock().unwrap();
        let owned: HashSet<&OpaqueId> = state
            .albums
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| &a.album_id)
            .collect();
        Ok(state
            .photos
            .iter()
            .filter(|p| owned.contains(&p.album_id))
            .cloned()
            .collect())
    }

    async fn list_user_photos_created_before(
        &self,
        user_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Photo>, AppError> {
        Ok(self
            .list_user_photos(user_id)
            .await?
            .into_iter()
            .filter(|p| p.created_at < cutoff)
            .collect())
    }

    async fn delete_photos(&self, photo_ids: &[OpaqueId]) -> Result<u64, AppError> {
        let mut state = self.state.lock().unwrap();
        let before = state.photos.len();
        state.photos.retain(|p| !photo_ids.contains(&p.photo_id));
        Ok((before - state.photos.len()) as u64)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| u.email == email) {
            return Err(AppError::Conflict(format!("email {} taken", email)));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }
}

#[derive(Default)]
struct StorageState {
    objects: HashMap<String, (String, Bytes)>,
    removed: Vec<String>,
    unavailable: HashSet<String>,
    failing_uploads: HashSet<String>,
    misrouted: HashSet<String>,
}

/// Storage fake that records every call
pub struct RecordingStorage {
    bucket: String,
    target_requests: AtomicUsize,
    state: Mutex<StorageState>,
}

impl RecordingStorage {
    pub fn new(bucket: &str) -> Arc<Self> {
        Arc::new(Self {
            bucket: bucket.to_string(),
            target_requests: AtomicUsize::new(0),
            state: Mutex::new(StorageState::default()),
        })
    }

    pub fn target_requests(&self) -> usize {
        self.target_requests.load(Ordering::SeqCst)
    }

    pub fn object(&self, path: &str) -> Option<(String, Bytes)> {
        self.state.lock().unwrap().objects.get(path).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.state.lock().unwrap().objects.len()
    }

    pub fn put_object(&self, path: &str, data: &'static [u8]) {
        self.state.lock().unwrap().objects.insert(
            path.to_string(),
            ("image/jpeg".to_string(), Bytes::from_static(data)),
        );
    }

    pub fn removed(&self) -> Vec<String> {
        self.state.lock().unwrap().removed.clone()
    }

    /// Target requests for `path` fail
    pub fn make_unavailable(&self, path: &str) {
        self.state.lock().unwrap().unavailable.insert(path.to_string());
    }

    /// Uploads to `path` fail
    pub fn fail_uploads_to(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_uploads
            .insert(path.to_string());
    }

    /// Targets for `path` come back for an unrelated path
    pub fn misroute(&self, path: &str) {
        self.state.lock().unwrap().misrouted.insert(path.to_string());
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://cdn.test/{}/{}", self.bucket, path)
    }

    async fn create_signed_upload_target(
        &self,
        path: &str,
        _expires_in: Duration,
    ) -> StorageResult<SignedTarget> {
        self.target_requests.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.unavailable.contains(path) {
            return Err(StorageError::BackendError("signing service down".to_string()));
        }
        let path = if state.misrouted.contains(path) {
            format!("elsewhere/{}", Uuid::new_v4())
        } else {
            path.to_string()
        };
        Ok(SignedTarget {
            token: format!("token-{}", path),
            upload_url: format!("https://upload.test/{}/{}", self.bucket, path),
            path,
        })
    }

    async fn upload_to_signed_target(
        &self,
        target: &SignedTarget,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<()> {
        let mut state = self.state.lock().unwrap();
        if target.token != format!("token-{}", target.path) {
            return Err(StorageError::SignatureRejected(target.path.clone()));
        }
        if state.failing_uploads.contains(&target.path) {
            return Err(StorageError::UploadFailed("connection reset".to_string()));
        }
        state
            .objects
            .insert(target.path.clone(), (content_type.to_string(), data));
        Ok(())
    }

    async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        self.object(path)
            .map(|(_, data)| data.to_vec())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        Ok(self.state.lock().unwrap().objects.contains_key(path))
    }

    async fn remove(&self, paths: &[String]) -> StorageResult<()> {
        let mut state = self.state.lock().unwrap();
        for path in paths {
            state.objects.remove(path);
            state.removed.push(path.clone());
        }
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

pub fn storages(
    photos: &Arc<RecordingStorage>,
    thumbnails: Option<&Arc<RecordingStorage>>,
) -> BucketStorages {
    BucketStorages {
        photos: photos.clone(),
        thumbnails: thumbnails.map(|t| t.clone() as Arc<dyn Storage>),
    }
}

/// A media item with stand-in payloads; no image decoding involved
pub fn media_item(name: &str) -> MediaItem {
    MediaItem {
        id: OpaqueId::generate(),
        original: MediaFile {
            name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            data: Bytes::from(format!("original:{}", name)),
        },
        thumbnail: MediaFile {
            name: format!("{}_thumb.webp", name),
            content_type: "image/webp".to_string(),
            data: Bytes::from(format!("thumbnail:{}", name)),
        },
        placeholder_hash: "L00000fQfQfQfQfQfQfQfQfQfQfQ".to_string(),
    }
}

/// A real JPEG of a flat colour
pub fn jpeg_bytes(width: u32, height: u32) -> Bytes {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([120, 160, 200])));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .unwrap();
    Bytes::from(buffer)
}
