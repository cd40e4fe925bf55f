use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blurhash::is_valid_blurhash;
use crate::error::AppError;
use crate::id::OpaqueId;

/// Object path for a photo: `{owner_id}/{parent_id}/{id}`
pub fn storage_path(owner_id: Uuid, parent_id: &OpaqueId, id: &OpaqueId) -> String {
    format!("{}/{}/{}", owner_id, parent_id, id)
}

/// Metadata row submitted to the store before any binary is uploaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadDescriptor {
    pub id: OpaqueId,
    pub parent_id: OpaqueId,
    pub storage_path: String,
    pub display_name: String,
    pub placeholder_hash: String,
}

impl UploadDescriptor {
    pub fn new(
        owner_id: Uuid,
        parent_id: OpaqueId,
        id: OpaqueId,
        display_name: impl Into<String>,
        placeholder_hash: impl Into<String>,
    ) -> Self {
        Self {
            storage_path: storage_path(owner_id, &parent_id, &id),
            id,
            parent_id,
            display_name: display_name.into(),
            placeholder_hash: placeholder_hash.into(),
        }
    }

    /// Reject descriptors the metadata store must not persist
    pub fn validate(&self) -> Result<(), AppError> {
        if !is_valid_blurhash(&self.placeholder_hash) {
            return Err(AppError::InvalidInput(format!(
                "Photo {} has a malformed placeholder hash",
                self.id
            )));
        }
        if self.display_name.trim().is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Photo {} has no name",
                self.id
            )));
        }
        Ok(())
    }
}

/// Short-lived, single-use write capability for one object path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTarget {
    pub path: String,
    pub token: String,
    pub upload_url: String,
}

impl SignedTarget {
    /// Whether this target was issued for the object identified by `id`
    pub fn matches(&self, id: &OpaqueId) -> bool {
        self.path.contains(id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_path_layout() {
        let owner = Uuid::new_v4();
        let album = OpaqueId::generate();
        let id = OpaqueId::generate();
        let d = UploadDescriptor::new(owner, album.clone(), id.clone(), "a.jpg", "hash");
        assert_eq!(d.storage_path, format!("{}/{}/{}", owner, album, id));
        assert_eq!(d.display_name, "a.jpg");
    }

    #[test]
    fn test_descriptor_validation() {
        let owner = Uuid::new_v4();
        let good = UploadDescriptor::new(
            owner,
            OpaqueId::generate(),
            OpaqueId::generate(),
            "a.jpg",
            "LEHV6nWB2yk8pyo0adR*.7kCMdnj",
        );
        assert!(good.validate().is_ok());

        let bad_hash = UploadDescriptor {
            placeholder_hash: "not a blurhash!".to_string(),
            ..good.clone()
        };
        assert!(matches!(bad_hash.validate(), Err(AppError::InvalidInput(_))));

        let unnamed = UploadDescriptor {
            display_name: "  ".to_string(),
            ..good
        };
        assert!(matches!(unnamed.validate(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_signed_target_matches_by_id() {
        let id = OpaqueId::parse("AAAAAAAAAA").unwrap();
        let other = OpaqueId::parse("BBBBBBBBBB").unwrap();
        let target = SignedTarget {
            path: format!("owner/album/{}", id),
            token: "t".to_string(),
            upload_url: "http://x".to_string(),
        };
        assert!(target.matches(&id));
        assert!(!target.matches(&other));
    }
}
