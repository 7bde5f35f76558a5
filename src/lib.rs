//! # colmatch
//!
//! Semantic column matching between tabular schemas, with a human review
//! loop on top.
//!
//! Given a *source* schema and a *data model* schema, each a list of columns
//! with a name and a free-text description, colmatch proposes which source
//! column feeds each data model column by comparing description embeddings.
//! A reviewer then accepts or rejects each proposal, reassigns rejected
//! columns from the pool of freed source columns, and submits until every
//! column is resolved.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! colmatch serve --http-port 8080
//! colmatch map --source source.json --data-model model.json --explain
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use colmatch::prelude::*;
//! use std::sync::Arc;
//!
//! let source = load_schema(r#"{"columns": [
//!     {"name": "id", "description": "unique customer identifier"},
//!     {"name": "addr", "description": "mailing address"}
//! ]}"#).unwrap();
//! let data_model = load_schema(r#"{"columns": [
//!     {"name": "cust_id", "description": "unique customer identifier"}
//! ]}"#).unwrap();
//!
//! let embedder: Arc<dyn TextEmbedder> = Arc::new(HashingEmbedder::default());
//! let mapping = propose_mapping(embedder, &data_model, &source).unwrap();
//! assert_eq!(mapping.source_for("cust_id"), Some("id"));
//! ```
//!
//! ## Crate Structure
//!
//! - [`colmatch-core`](https://docs.rs/colmatch-core) - Schemas, embedders, similarity index
//! - [`colmatch-mapping`](https://docs.rs/colmatch-mapping) - Matching, mapping, reconciliation sessions
//! - [`colmatch-api`](https://docs.rs/colmatch-api) - REST API

pub mod config;

pub use config::{AppConfig, EmbedderBackend};

// Re-export core types
pub use colmatch_core::{
    load_schema, load_schema_from_path, ColumnRecord, EmbedderBuilder, EmbedderConfig, EmbeddingError, Error,
    Field, HashingEmbedder, RemoteEmbedder, Result, Schema, SimilarityIndex, TextEmbedder, Vector,
};

// Re-export mapping and workflow
pub use colmatch_mapping::{
    apply_override, is_resolved, propose_mapping, record_confirmation, ConfirmationState, Mapping, MappingEntry,
    MatchReport, ReconciliationState, ReviewPass, SchemaMapper, SchemaSide, Session, SubmitOutcome, WorkflowError,
};

// Re-export API
pub use colmatch_api::{RestApi, SessionRegistry};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        apply_override, is_resolved, load_schema, load_schema_from_path, propose_mapping, record_confirmation,
        AppConfig, ColumnRecord, ConfirmationState, EmbedderConfig, EmbeddingError, Error, Field, HashingEmbedder,
        Mapping, ReconciliationState, Result, Schema, SchemaMapper, Session, SimilarityIndex, SubmitOutcome,
        TextEmbedder, WorkflowError,
    };
}
