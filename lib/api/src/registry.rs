use ahash::AHashMap;
use colmatch_core::{Schema, TextEmbedder};
use colmatch_mapping::Session;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use uuid::Uuid;

/// Open reconciliation sessions, keyed by id.
///
/// The map lock is only held to look a session up; each session has its own
/// lock, so actions on different sessions never wait on each other.
pub struct SessionRegistry {
    embedder: Arc<dyn TextEmbedder>,
    sessions: RwLock<AHashMap<Uuid, Arc<Mutex<Session>>>>,
}

impl SessionRegistry {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self {
            embedder,
            sessions: RwLock::new(AHashMap::new()),
        }
    }

    pub fn embedder(&self) -> &Arc<dyn TextEmbedder> {
        &self.embedder
    }

    /// Open a session over two schemas and return its id
    pub fn create(&self, source: Schema, data_model: Schema) -> Uuid {
        let session = Session::new(self.embedder.clone(), source, data_model);
        let id = session.id();
        self.sessions.write().insert(id, Arc::new(Mutex::new(session)));
        tracing::info!(session = %id, "Opened session");
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().get(id).cloned()
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "Closed session");
        }
        removed
    }

    /// Session ids, sorted for stable listings
    pub fn ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.sessions.read().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colmatch_core::{ColumnRecord, HashingEmbedder};

    fn schema(label: &str) -> Schema {
        Schema::new(label, vec![ColumnRecord::new("id", "unique customer identifier")])
    }

    #[test]
    fn test_create_get_remove() {
        let registry = SessionRegistry::new(Arc::new(HashingEmbedder::default()));
        assert!(registry.is_empty());

        let a = registry.create(schema("a"), schema("b"));
        let b = registry.create(schema("a"), schema("b"));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(&a).unwrap().lock().id(), a);

        assert!(registry.remove(&a));
        assert!(!registry.remove(&a));
        assert!(registry.get(&a).is_none());
        assert_eq!(registry.ids(), vec![b]);
    }
}
