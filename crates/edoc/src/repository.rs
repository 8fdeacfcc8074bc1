//! Document persistence seam.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use fiscaledi_core::{DocumentId, DomainError, DomainResult, Entity};

use crate::document::Document;

/// Document storage abstraction.
///
/// `save` must run [`Document::validate`] and refuse the write when it fails.
pub trait DocumentRepository: Send + Sync {
    fn get(&self, id: DocumentId) -> Option<Document>;
    fn save(&self, document: &Document) -> DomainResult<()>;
    fn list(&self) -> Vec<Document>;
}

impl<R> DocumentRepository for Arc<R>
where
    R: DocumentRepository + ?Sized,
{
    fn get(&self, id: DocumentId) -> Option<Document> {
        (**self).get(id)
    }

    fn save(&self, document: &Document) -> DomainResult<()> {
        (**self).save(document)
    }

    fn list(&self) -> Vec<Document> {
        (**self).list()
    }
}

/// In-memory repository for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDocumentRepository {
    inner: RwLock<HashMap<DocumentId, Document>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentRepository for InMemoryDocumentRepository {
    fn get(&self, id: DocumentId) -> Option<Document> {
        let map = self.inner.read().ok()?;
        map.get(&id).cloned()
    }

    fn save(&self, document: &Document) -> DomainResult<()> {
        document.validate()?;

        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::conflict("document store lock poisoned"))?;
        map.insert(*document.id(), document.clone());
        tracing::debug!(document_id = %document.id(), "document saved");
        Ok(())
    }

    fn list(&self) -> Vec<Document> {
        match self.inner.read() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => vec![],
        }
    }
}
