//! # colmatch Mapping
//!
//! Candidate matching, schema mapping and the reconciliation workflow.
//!
//! - [`IndexCache`] - Per-field source indexes, built once and shared
//! - [`SchemaMapper`] - Data model columns to their best source column
//! - [`Session`] - Propose, review, override and resolve a [`Mapping`]
//!
//! ## Example
//!
//! ```rust
//! use colmatch_core::{load_schema, HashingEmbedder};
//! use colmatch_mapping::{Session, SubmitOutcome};
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
//! let mut session = Session::new(Arc::new(HashingEmbedder::default()), source, data_model);
//! assert_eq!(session.propose().unwrap().source_for("cust_id"), Some("id"));
//!
//! session.confirm("cust_id", true).unwrap();
//! assert_eq!(session.submit().unwrap(), SubmitOutcome::Resolved);
//! ```

pub mod error;
pub mod mapper;
pub mod matcher;
pub mod reconcile;
pub mod session;

pub use error::WorkflowError;
pub use mapper::{propose_mapping, ColumnReport, Mapping, MappingEntry, MatchReport, SchemaMapper, ScoredMatch};
pub use matcher::{best_match, best_match_with_score, IndexCache};
pub use reconcile::{
    apply_override, is_resolved, not_valid_columns, record_confirmation, residual_pool, unreviewed_columns,
    ConfirmationState, ReviewPass,
};
pub use session::{ReconciliationState, ReviewRow, SchemaSide, Session, SessionSnapshot, SubmitOutcome};
