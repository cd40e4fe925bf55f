use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blurhash::{is_valid_blurhash, FALLBACK_BLURHASH};
use crate::id::OpaqueId;

/// Shown in place of a photo whose storage path is missing
pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/1x1/fafafa/fafafa/jpg";

/// Photo metadata row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Photo {
    pub photo_id: OpaqueId,
    pub album_id: OpaqueId,
    pub file_path: String,
    pub name: String,
    pub blurhash: String,
    pub created_at: DateTime<Utc>,
}

/// A photo as presented in a gallery listing
#[derive(Debug, Clone, Serialize)]
pub struct PhotoView {
    pub photo_id: OpaqueId,
    pub album_id: OpaqueId,
    pub name: String,
    pub url: String,
    pub blurhash: String,
    pub created_at: DateTime<Utc>,
}

impl PhotoView {
    /// Build a view using `resolve_url` for non-empty paths
    ///
    /// A stored hash that is not a well-formed BlurHash is replaced with
    /// [`FALLBACK_BLURHASH`].
    pub fn from_photo(photo: Photo, resolve_url: impl Fn(&str) -> String) -> Self {
        let url = if photo.file_path.trim().is_empty() {
            PLACEHOLDER_IMAGE_URL.to_string()
        } else {
            resolve_url(&photo.file_path)
        };
        let blurhash = if is_valid_blurhash(&photo.blurhash) {
            photo.blurhash
        } else {
            FALLBACK_BLURHASH.to_string()
        };
        Self {
            photo_id: photo.photo_id,
            album_id: photo.album_id,
            name: photo.name,
            url,
            blurhash,
            created_at: photo.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(path: &str) -> Photo {
        Photo {
            photo_id: OpaqueId::generate(),
            album_id: OpaqueId::generate(),
            file_path: path.to_string(),
            name: "beach.jpg".to_string(),
            blurhash: "L00000fQfQfQfQfQfQfQfQfQfQfQ".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_view_uses_resolver() {
        let view = PhotoView::from_photo(photo("u/a/p"), |p| format!("https://cdn/{}", p));
        assert_eq!(view.url, "https://cdn/u/a/p");
    }

    #[test]
    fn test_view_falls_back_to_placeholder() {
        let view = PhotoView::from_photo(photo(""), |p| format!("https://cdn/{}", p));
        assert_eq!(view.url, PLACEHOLDER_IMAGE_URL);
    }

    #[test]
    fn test_view_replaces_malformed_hash() {
        let good = PhotoView::from_photo(photo("u/a/p"), |p| p.to_string());
        assert_eq!(good.blurhash, "L00000fQfQfQfQfQfQfQfQfQfQfQ");

        let mut stored = photo("u/a/p");
        stored.blurhash = "not a blurhash!".to_string();
        let view = PhotoView::from_photo(stored, |p| p.to_string());
        assert_eq!(view.blurhash, FALLBACK_BLURHASH);
    }
}
