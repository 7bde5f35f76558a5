//! HTTP client for an external embedding service.
//!
//! Speaks the text-embeddings-inference protocol: `POST {url}/embed` with
//! `{"inputs": [...], "normalize": bool}`, answered by one vector per input.
//! Calls are blocking and bounded by a request timeout; failures are
//! reported, never retried.

use crate::embedder::{EmbedderConfig, TextEmbedder};
use crate::{EmbeddingError, Vector};
use serde::Serialize;
use std::time::Duration;

/// Default request timeout for the remote service
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [&'a str],
    normalize: bool,
}

pub struct RemoteEmbedder {
    config: EmbedderConfig,
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl RemoteEmbedder {
    pub fn new(config: EmbedderConfig, base_url: &str, timeout: Duration) -> Result<Self, EmbeddingError> {
        config.validate()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            config,
            endpoint: format!("{}/embed", base_url.trim_end_matches('/')),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn check_dim(&self, vector: &[f32]) -> Result<(), EmbeddingError> {
        if vector.len() != self.config.dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.config.dim,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for RemoteEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteEmbedder")
            .field("config", &self.config)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl TextEmbedder for RemoteEmbedder {
    fn config(&self) -> &EmbedderConfig {
        &self.config
    }

    fn embed(&self, text: &str) -> Result<Vector, EmbeddingError> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| EmbeddingError::Unavailable("empty response".to_string()))
    }

    /// One round trip for the whole batch
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>, EmbeddingError> {
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(EmbeddingError::EmptyInput);
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(endpoint = %self.endpoint, model = %self.config.model, count = texts.len(), "Requesting embeddings");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest {
                inputs: texts,
                normalize: self.config.normalize,
            })
            .send()
            .map_err(|e| EmbeddingError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EmbeddingError::Unavailable(format!("{}: {}", status, body)));
        }

        let vectors: Vec<Vec<f32>> = response
            .json()
            .map_err(|e| EmbeddingError::Unavailable(format!("invalid response body: {}", e)))?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::Unavailable(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        vectors
            .into_iter()
            .map(|v| {
                self.check_dim(&v)?;
                let mut vector = Vector::new(v);
                if vector.norm() <= f32::EPSILON {
                    return Err(EmbeddingError::Unavailable("service returned a zero vector".to_string()));
                }
                if self.config.normalize {
                    vector.normalize();
                }
                Ok(vector)
            })
            .collect()
    }
}
