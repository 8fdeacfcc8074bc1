//! Attachment storage seam (XML requests/responses, rendered PDFs).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use fiscaledi_core::{AttachmentId, ValueObject};

/// Descriptor of a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub name: String,
    pub mimetype: String,
}

impl ValueObject for Attachment {}

/// Attachment store abstraction.
///
/// Methods take `&self`; implementations handle their own synchronization.
pub trait ArtifactStore: Send + Sync {
    fn get(&self, id: AttachmentId) -> Option<Attachment>;
    fn content(&self, id: AttachmentId) -> Option<Vec<u8>>;
    fn store(&self, name: &str, mimetype: &str, content: Vec<u8>) -> Attachment;
}

impl<S> ArtifactStore for Arc<S>
where
    S: ArtifactStore + ?Sized,
{
    fn get(&self, id: AttachmentId) -> Option<Attachment> {
        (**self).get(id)
    }

    fn content(&self, id: AttachmentId) -> Option<Vec<u8>> {
        (**self).content(id)
    }

    fn store(&self, name: &str, mimetype: &str, content: Vec<u8>) -> Attachment {
        (**self).store(name, mimetype, content)
    }
}

/// In-memory attachment store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    inner: RwLock<HashMap<AttachmentId, (Attachment, Vec<u8>)>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn get(&self, id: AttachmentId) -> Option<Attachment> {
        let map = self.inner.read().ok()?;
        map.get(&id).map(|(a, _)| a.clone())
    }

    fn content(&self, id: AttachmentId) -> Option<Vec<u8>> {
        let map = self.inner.read().ok()?;
        map.get(&id).map(|(_, c)| c.clone())
    }

    fn store(&self, name: &str, mimetype: &str, content: Vec<u8>) -> Attachment {
        let attachment = Attachment {
            id: AttachmentId::new(),
            name: name.to_string(),
            mimetype: mimetype.to_string(),
        };
        if let Ok(mut map) = self.inner.write() {
            map.insert(attachment.id, (attachment.clone(), content));
        }
        attachment
    }
}
