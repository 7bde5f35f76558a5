//! # colmatch Core
//!
//! Core library for colmatch, the semantic column matcher.
//!
//! This crate provides the fundamental data structures and services:
//!
//! - [`ColumnRecord`] / [`Schema`] - Columns described by name and free text
//! - [`TextEmbedder`] - Text to vector, with [`HashingEmbedder`] and [`RemoteEmbedder`]
//! - [`SimilarityIndex`] - Exact cosine nearest-neighbor search over one schema field
//!
//! ## Example
//!
//! ```rust
//! use colmatch_core::{load_schema, Field, HashingEmbedder, SimilarityIndex, TextEmbedder};
//! use std::sync::Arc;
//!
//! let source = load_schema(r#"{"columns": [
//!     {"name": "id", "description": "unique customer identifier"},
//!     {"name": "addr", "description": "mailing address"}
//! ]}"#).unwrap();
//!
//! let embedder: Arc<dyn TextEmbedder> = Arc::new(HashingEmbedder::default());
//! let index = SimilarityIndex::build(embedder, &source, Field::Description).unwrap();
//!
//! let hits = index.query("customer identifier", 1).unwrap();
//! assert_eq!(hits[0].0.name, "id");
//! ```

pub mod embedder;
pub mod error;
pub mod index;
pub mod record;
pub mod remote;
pub mod vector;

pub use embedder::{EmbedderBuilder, EmbedderConfig, HashingEmbedder, TextEmbedder, DEFAULT_DIM, HASHING_MODEL};
pub use error::{EmbeddingError, Error, Result};
pub use index::SimilarityIndex;
pub use record::{load_schema, load_schema_from_path, ColumnRecord, Field, Schema};
pub use remote::RemoteEmbedder;
pub use vector::Vector;
