use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::id::OpaqueId;

const MAX_ALBUM_NAME_LEN: usize = 120;

/// An album owned by a single user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Album {
    pub album_id: OpaqueId,
    pub user_id: Uuid,
    pub name: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

/// Album creation request, validated before it reaches the store
#[derive(Debug, Clone)]
pub struct NewAlbum {
    pub album_id: OpaqueId,
    pub user_id: Uuid,
    pub name: String,
    pub is_public: bool,
}

impl NewAlbum {
    pub fn new(user_id: Uuid, name: &str, is_public: bool) -> Result<Self, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput(
                "Album name must not be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_ALBUM_NAME_LEN {
            return Err(AppError::InvalidInput(format!(
                "Album name must be at most {} characters",
                MAX_ALBUM_NAME_LEN
            )));
        }
        Ok(Self {
            album_id: OpaqueId::generate(),
            user_id,
            name: name.to_string(),
            is_public,
        })
    }
}
