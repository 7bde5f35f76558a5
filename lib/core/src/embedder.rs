//! Text Embedder
//!
//! Converts a text string into a fixed-dimension vector. Embedders are
//! configured explicitly at construction through [`EmbedderConfig`]; nothing
//! here reads global state, so several sessions can run different models side
//! by side and tests can inject a deterministic stub.

use crate::{EmbeddingError, Vector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// Default embedding dimension (matches bge-small class models)
pub const DEFAULT_DIM: usize = 384;

/// Model name reported by the built-in hashing embedder
pub const HASHING_MODEL: &str = "hashing-trigram";

/// Model configuration shared by every embedder implementation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbedderConfig {
    /// Model identifier, e.g. `BAAI/bge-small-en`
    #[serde(default = "default_model")]
    pub model: String,

    /// Output vector dimension
    #[serde(default = "default_dim")]
    pub dim: usize,

    /// Scale every output vector to unit length.
    /// Cosine search over non-normalized output still works because the
    /// index normalizes on insert, but scores are only comparable across
    /// embedders when this is on.
    #[serde(default = "default_normalize")]
    pub normalize: bool,
}

fn default_model() -> String {
    HASHING_MODEL.to_string()
}

fn default_dim() -> usize {
    DEFAULT_DIM
}

fn default_normalize() -> bool {
    true
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            dim: default_dim(),
            normalize: default_normalize(),
        }
    }
}

impl EmbedderConfig {
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.dim == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "dimension must be greater than zero".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig("model name is empty".to_string()));
        }
        Ok(())
    }
}

/// Turns text into vectors.
///
/// Implementations must be deterministic for a fixed configuration and must
/// report failures as errors instead of returning a zero vector.
pub trait TextEmbedder: Send + Sync {
    fn config(&self) -> &EmbedderConfig;

    fn embed(&self, text: &str) -> Result<Vector, EmbeddingError>;

    fn dim(&self) -> usize {
        self.config().dim
    }

    /// Embed many texts, in parallel, preserving input order.
    /// Fails as a whole on the first error.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>, EmbeddingError> {
        texts.par_iter().map(|text| self.embed(text)).collect()
    }
}

impl<T: TextEmbedder + ?Sized> TextEmbedder for std::sync::Arc<T> {
    fn config(&self) -> &EmbedderConfig {
        (**self).config()
    }

    fn embed(&self, text: &str) -> Result<Vector, EmbeddingError> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>, EmbeddingError> {
        (**self).embed_batch(texts)
    }
}

/// Deterministic feature-hashing embedder.
///
/// Lowercased character trigrams and whole words are hashed into `dim`
/// buckets (words weigh twice as much as trigrams). Identical text always
/// yields an identical vector; texts sharing words and word fragments land
/// close in cosine space.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    config: EmbedderConfig,
}

impl HashingEmbedder {
    pub fn new(config: EmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;
        Ok(Self { config })
    }

    fn bucket(&self, token: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        (hasher.finish() as usize) % self.config.dim
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            config: EmbedderConfig::default(),
        }
    }
}

impl TextEmbedder for HashingEmbedder {
    fn config(&self) -> &EmbedderConfig {
        &self.config
    }

    fn embed(&self, text: &str) -> Result<Vector, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let normalized = text.to_lowercase();
        let mut components = vec![0.0f32; self.config.dim];

        for trigram in generate_trigrams(&normalized) {
            components[self.bucket(&trigram)] += 1.0;
        }

        for word in normalized.split_whitespace() {
            components[self.bucket(word)] += 2.0;
        }

        let mut vector = Vector::new(components);
        if self.config.normalize {
            vector.normalize();
        }
        tracing::trace!(len = text.len(), dim = vector.dim(), "Embedded text");
        Ok(vector)
    }
}

/// Generate character trigrams from a string
fn generate_trigrams(s: &str) -> HashSet<String> {
    let padded = format!("  {}  ", s);
    let chars: Vec<char> = padded.chars().collect();

    if chars.len() < 3 {
        return HashSet::new();
    }

    chars.windows(3).map(|w| w.iter().collect::<String>()).collect()
}

/// Builder for creating a HashingEmbedder with custom options
#[derive(Debug, Clone, Default)]
pub struct EmbedderBuilder {
    config: EmbedderConfig,
}

impl EmbedderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn dim(mut self, dim: usize) -> Self {
        self.config.dim = dim;
        self
    }

    pub fn normalize(mut self, normalize: bool) -> Self {
        self.config.normalize = normalize;
        self
    }

    pub fn build(self) -> Result<HashingEmbedder, EmbeddingError> {
        HashingEmbedder::new(self.config)
    }
}
