//! Application configuration, read from an optional JSON file.
//!
//! ```json
//! {
//!   "embedder": {"model": "BAAI/bge-small-en", "dim": 384, "normalize": true},
//!   "backend": {"type": "remote", "url": "http://localhost:8080", "timeout_secs": 10}
//! }
//! ```
//!
//! Every field is optional; a missing file section falls back to the built-in
//! hashing embedder.

use colmatch_core::remote::DEFAULT_TIMEOUT;
use colmatch_core::{EmbedderConfig, Error, HashingEmbedder, RemoteEmbedder, Result, TextEmbedder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub embedder: EmbedderConfig,
    pub backend: EmbedderBackend,
}

/// Where embeddings come from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmbedderBackend {
    /// In-process feature hashing, no external service
    #[default]
    Hashing,
    /// text-embeddings-inference compatible HTTP service
    Remote {
        url: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl AppConfig {
    pub fn from_json_str(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Construct the configured embedder.
    ///
    /// The remote backend uses a blocking HTTP client, so this must not be
    /// called from inside an async runtime.
    pub fn build_embedder(&self) -> Result<Arc<dyn TextEmbedder>> {
        let embedder: Arc<dyn TextEmbedder> = match &self.backend {
            EmbedderBackend::Hashing => Arc::new(HashingEmbedder::new(self.embedder.clone())?),
            EmbedderBackend::Remote { url, timeout_secs } => Arc::new(RemoteEmbedder::new(
                self.embedder.clone(),
                url,
                Duration::from_secs(*timeout_secs),
            )?),
        };
        tracing::info!(model = %self.embedder.model, dim = self.embedder.dim, "Embedder ready");
        Ok(embedder)
    }
}
