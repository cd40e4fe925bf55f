use std::collections::HashMap;
use toucan_core::models::UploadDescriptor;
use toucan_core::OpaqueId;
use toucan_processing::MediaItem;
use uuid::Uuid;

/// Items of one upload batch, held from staging until upload or failure
///
/// Every descriptor handed out by [`UploadSession::stage`] has its item kept
/// here, keyed by id.
#[derive(Debug)]
pub struct UploadSession {
    owner_id: Uuid,
    album_id: OpaqueId,
    descriptors: Vec<UploadDescriptor>,
    pending: HashMap<OpaqueId, MediaItem>,
}

impl UploadSession {
    pub fn new(owner_id: Uuid, album_id: OpaqueId) -> Self {
        Self {
            owner_id,
            album_id,
            descriptors: Vec::new(),
            pending: HashMap::new(),
        }
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn album_id(&self) -> &OpaqueId {
        &self.album_id
    }

    /// Take ownership of `items` and describe them for the metadata commit
    pub fn stage(&mut self, items: Vec<MediaItem>) -> Vec<UploadDescriptor> {
        let mut staged = Vec::with_capacity(items.len());
        for item in items {
            let descriptor = UploadDescriptor::new(
                self.owner_id,
                self.album_id.clone(),
                item.id.clone(),
                item.original.name.clone(),
                item.placeholder_hash.clone(),
            );
            self.pending.insert(item.id.clone(), item);
            staged.push(descriptor);
        }
        self.descriptors.extend(staged.iter().cloned());
        staged
    }

    /// Descriptors in staging order
    pub fn descriptors(&self) -> &[UploadDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, id: &OpaqueId) -> Option<&MediaItem> {
        self.pending.get(id)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use toucan_processing::MediaFile;

    fn item(name: &str) -> MediaItem {
        let file = MediaFile {
            name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            data: Bytes::from_static(b"jpeg"),
        };
        MediaItem {
            id: OpaqueId::generate(),
            original: file.clone(),
            thumbnail: file,
            placeholder_hash: "L00000fQfQfQfQfQfQfQfQfQfQfQ".to_string(),
        }
    }

    #[test]
    fn test_stage_keeps_every_described_item() {
        let owner = Uuid::new_v4();
        let album = OpaqueId::generate();
        let mut session = UploadSession::new(owner, album.clone());

        let items = vec![item("a.jpg"), item("b.jpg")];
        let ids: Vec<_> = items.iter().map(|i| i.id.clone()).collect();
        let descriptors = session.stage(items);

        assert_eq!(descriptors.len(), 2);
        assert_eq!(session.len(), 2);
        for (descriptor, id) in descriptors.iter().zip(&ids) {
            assert_eq!(&descriptor.id, id);
            assert_eq!(descriptor.storage_path, format!("{}/{}/{}", owner, album, id));
            assert!(session.get(id).is_some());
        }
        assert_eq!(descriptors[1].display_name, "b.jpg");
    }
}
