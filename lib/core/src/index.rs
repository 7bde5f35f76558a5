use crate::embedder::TextEmbedder;
use crate::record::{ColumnRecord, Field, Schema};
use crate::{EmbeddingError, Vector};
use ordered_float::OrderedFloat;
use std::sync::Arc;

/// In-memory nearest-neighbor index over one field of one schema.
///
/// Built once from a schema and then read-only: vectors are stored in
/// insertion order next to the record they came from. Search is exact cosine
/// similarity, highest first, with ties going to the earlier record.
pub struct SimilarityIndex {
    field: Field,
    label: String,
    embedder: Arc<dyn TextEmbedder>,
    entries: Vec<(Vector, ColumnRecord)>,
}

impl SimilarityIndex {
    /// Embed the selected field of every record and store the pairs.
    /// An empty schema produces a valid, empty index.
    pub fn build(
        embedder: Arc<dyn TextEmbedder>,
        schema: &Schema,
        field: Field,
    ) -> Result<Self, EmbeddingError> {
        let texts: Vec<_> = schema.iter().map(|record| field.text(record)).collect();
        let refs: Vec<&str> = texts.iter().map(|t| &**t).collect();

        let vectors = if refs.is_empty() {
            Vec::new()
        } else {
            embedder.embed_batch(&refs)?
        };

        if vectors.len() != refs.len() {
            return Err(EmbeddingError::Unavailable(format!(
                "expected {} embeddings, got {}",
                refs.len(),
                vectors.len()
            )));
        }

        let dim = embedder.dim();
        let mut entries = Vec::with_capacity(vectors.len());
        for (vector, record) in vectors.into_iter().zip(schema.iter()) {
            entries.push((checked_unit(vector, dim)?, record.clone()));
        }

        tracing::debug!(schema = %schema.label, field = %field, records = entries.len(), "Built similarity index");

        Ok(Self {
            field,
            label: schema.label.clone(),
            embedder,
            entries,
        })
    }

    pub fn field(&self) -> Field {
        self.field
    }

    /// Label of the schema this index was built from
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn embedder(&self) -> &Arc<dyn TextEmbedder> {
        &self.embedder
    }

    /// Embed `text` and return the `k` most similar records, best first.
    /// An empty index returns no results without calling the embedder.
    pub fn query(&self, text: &str, k: usize) -> Result<Vec<(&ColumnRecord, f32)>, EmbeddingError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let query = self.embedder.embed(text)?;
        self.query_vector(&query, k)
    }

    /// Search with a pre-computed query vector
    pub fn query_vector(
        &self,
        query: &Vector,
        k: usize,
    ) -> Result<Vec<(&ColumnRecord, f32)>, EmbeddingError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query = checked_unit(query.clone(), self.embedder.dim())?;
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, (vector, _))| (position, vector.dot(&query)))
            .collect();

        // stable sort keeps insertion order among equal scores
        scored.sort_by_key(|&(_, score)| std::cmp::Reverse(OrderedFloat(score)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| (&self.entries[position].1, score))
            .collect())
    }

    /// Iterate over the indexed records in insertion order
    pub fn records(&self) -> impl Iterator<Item = &ColumnRecord> {
        self.entries.iter().map(|(_, record)| record)
    }
}

impl std::fmt::Debug for SimilarityIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityIndex")
            .field("field", &self.field)
            .field("label", &self.label)
            .field("model", &self.embedder.config().model)
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Scale `vector` to unit length, rejecting wrong dimensions and zero vectors
fn checked_unit(vector: Vector, dim: usize) -> Result<Vector, EmbeddingError> {
    if vector.dim() != dim {
        return Err(EmbeddingError::DimensionMismatch {
            expected: dim,
            actual: vector.dim(),
        });
    }
    if vector.norm() <= f32::EPSILON {
        return Err(EmbeddingError::Unavailable("embedder returned a zero vector".to_string()));
    }
    if vector.is_unit() {
        Ok(vector)
    } else {
        Ok(vector.normalized())
    }
}
