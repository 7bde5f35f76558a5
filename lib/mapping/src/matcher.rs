//! Candidate matching against cached per-field indexes.

use colmatch_core::{ColumnRecord, EmbeddingError, Field, Schema, SimilarityIndex, TextEmbedder};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type Slot = Mutex<Option<Arc<SimilarityIndex>>>;

/// Lazily built indexes over one schema, one per [`Field`].
///
/// Each field's index is built on first use and then shared; queries never
/// trigger a rebuild. Every field has its own lock, so different fields can be
/// built concurrently while two callers asking for the same field build it
/// only once.
pub struct IndexCache {
    embedder: Arc<dyn TextEmbedder>,
    schema: Arc<Schema>,
    slots: [Slot; 3],
    builds: AtomicUsize,
}

impl IndexCache {
    pub fn new(embedder: Arc<dyn TextEmbedder>, schema: Arc<Schema>) -> Self {
        Self {
            embedder,
            schema,
            slots: [Mutex::new(None), Mutex::new(None), Mutex::new(None)],
            builds: AtomicUsize::new(0),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn embedder(&self) -> &Arc<dyn TextEmbedder> {
        &self.embedder
    }

    fn slot(&self, field: Field) -> &Slot {
        match field {
            Field::Name => &self.slots[0],
            Field::Description => &self.slots[1],
            Field::Combined => &self.slots[2],
        }
    }

    /// Get the index for `field`, building it if this is the first request.
    /// A failed build leaves the slot empty so a later call can retry.
    pub fn get(&self, field: Field) -> Result<Arc<SimilarityIndex>, EmbeddingError> {
        let mut slot = self.slot(field).lock();
        if let Some(index) = slot.as_ref() {
            return Ok(index.clone());
        }

        let index = Arc::new(SimilarityIndex::build(self.embedder.clone(), &self.schema, field)?);
        self.builds.fetch_add(1, Ordering::Relaxed);
        *slot = Some(index.clone());
        Ok(index)
    }

    /// Build two field indexes concurrently
    pub fn get_pair(
        &self,
        a: Field,
        b: Field,
    ) -> Result<(Arc<SimilarityIndex>, Arc<SimilarityIndex>), EmbeddingError> {
        let (a, b) = rayon::join(|| self.get(a), || self.get(b));
        Ok((a?, b?))
    }

    /// Number of index builds performed so far
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for IndexCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexCache")
            .field("schema", &self.schema.label)
            .field("builds", &self.builds())
            .finish()
    }
}

/// Single best match for `query_text`, or `None` if the index has nothing
pub fn best_match<'a>(
    query_text: &str,
    index: &'a SimilarityIndex,
) -> Result<Option<&'a ColumnRecord>, EmbeddingError> {
    Ok(best_match_with_score(query_text, index)?.map(|(record, _)| record))
}

pub fn best_match_with_score<'a>(
    query_text: &str,
    index: &'a SimilarityIndex,
) -> Result<Option<(&'a ColumnRecord, f32)>, EmbeddingError> {
    Ok(index.query(query_text, 1)?.into_iter().next())
}
