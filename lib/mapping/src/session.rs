//! Reconciliation session state machine.
//!
//! ```text
//!  Unmapped ──propose──> Proposed ──confirm──> UnderReview ──submit──> Resolved
//!                          ^                    │   ^    │
//!                          │                    │   └────┘ confirm / override /
//!                          └───── propose ──────┘          leave_unmapped / submit
//! ```
//!
//! `propose` is accepted from every state and always starts a fresh review.
//! Every other action validates first and leaves the session untouched when
//! it is rejected.

use crate::error::WorkflowError;
use crate::mapper::{Mapping, MatchReport, SchemaMapper};
use crate::reconcile::{
    apply_override, is_resolved, record_confirmation, unreviewed_columns, ConfirmationState,
    ReviewPass,
};
use colmatch_core::{EmbeddingError, Schema, TextEmbedder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationState {
    Unmapped,
    Proposed,
    UnderReview,
    Resolved,
}

impl std::fmt::Display for ReconciliationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconciliationState::Unmapped => write!(f, "unmapped"),
            ReconciliationState::Proposed => write!(f, "proposed"),
            ReconciliationState::UnderReview => write!(f, "under review"),
            ReconciliationState::Resolved => write!(f, "resolved"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaSide {
    Source,
    DataModel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Resolved,
    Pending {
        not_valid: Vec<String>,
        unreviewed: Vec<String>,
        residual_pool: Vec<String>,
    },
}

/// One line of the review table handed to a display layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRow {
    pub column: String,
    pub description: String,
    pub source: Option<String>,
    pub source_description: Option<String>,
    pub confirmed: Option<bool>,
    pub left_unmapped: bool,
}

/// Serializable view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub state: ReconciliationState,
    pub model: String,
    pub source: String,
    pub data_model: String,
    pub mapping: Option<Mapping>,
    pub confirmations: ConfirmationState,
    pub review: Option<ReviewPass>,
    pub rows: Vec<ReviewRow>,
}

/// One interactive reconciliation between a source and a data model schema.
///
/// Mutating methods take `&mut self`, so transitions on one session are
/// applied one at a time; callers sharing a session across threads put it
/// behind a lock.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    data_model: Arc<Schema>,
    mapper: SchemaMapper,
    mapping: Option<Mapping>,
    confirmations: ConfirmationState,
    review: Option<ReviewPass>,
    state: ReconciliationState,
}

impl Session {
    pub fn new(embedder: Arc<dyn TextEmbedder>, source: Schema, data_model: Schema) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session = %id, model = %embedder.config().model, source = %source.label, data_model = %data_model.label, "Created session");
        Self {
            id,
            data_model: Arc::new(data_model),
            mapper: SchemaMapper::new(embedder, Arc::new(source)),
            mapping: None,
            confirmations: ConfirmationState::new(),
            review: None,
            state: ReconciliationState::Unmapped,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ReconciliationState {
        self.state
    }

    pub fn source(&self) -> &Schema {
        self.mapper.source()
    }

    pub fn data_model(&self) -> &Schema {
        &self.data_model
    }

    pub fn mapping(&self) -> Option<&Mapping> {
        self.mapping.as_ref()
    }

    pub fn confirmations(&self) -> &ConfirmationState {
        &self.confirmations
    }

    pub fn review(&self) -> Option<&ReviewPass> {
        self.review.as_ref()
    }

    pub fn model(&self) -> &str {
        &self.mapper.cache().embedder().config().model
    }

    /// Number of source indexes built during this session
    pub fn index_builds(&self) -> usize {
        self.mapper.cache().builds()
    }

    pub fn is_resolved(&self) -> bool {
        self.state == ReconciliationState::Resolved
    }

    /// The reviewed mapping, once every column is resolved
    pub fn final_mapping(&self) -> Option<&Mapping> {
        if self.is_resolved() {
            self.mapping.as_ref()
        } else {
            None
        }
    }

    /// Description of a column on either side, for hover text
    pub fn describe(&self, side: SchemaSide, name: &str) -> Option<&str> {
        match side {
            SchemaSide::Source => self.source().description_of(name),
            SchemaSide::DataModel => self.data_model.description_of(name),
        }
    }

    /// Compute a fresh mapping and restart the review.
    ///
    /// On failure nothing changes: the previous mapping, decisions and state
    /// are kept.
    pub fn propose(&mut self) -> Result<&Mapping, EmbeddingError> {
        let mapping = self.mapper.map(&self.data_model)?;

        self.confirmations.reset();
        self.review = None;
        self.state = ReconciliationState::Proposed;
        tracing::info!(session = %self.id, columns = mapping.len(), "Proposed mapping");

        Ok(&*self.mapping.insert(mapping))
    }

    /// Side-by-side name and description matches for every data model column
    pub fn report(&self) -> Result<MatchReport, EmbeddingError> {
        self.mapper.report(&self.data_model)
    }

    /// Record an accept/reject decision for one data model column
    pub fn confirm(&mut self, column: &str, accepted: bool) -> Result<(), WorkflowError> {
        self.expect_reviewable("confirm")?;
        self.expect_column(column)?;

        let mapping = self.mapping.as_ref().ok_or(WorkflowError::InvalidTransition {
            action: "confirm",
            state: self.state,
        })?;
        if accepted && mapping.source_for(column).is_none() {
            return Err(WorkflowError::Unmapped(column.to_string()));
        }

        self.confirmations = record_confirmation(&self.confirmations, column, accepted);
        if accepted {
            if let Some(review) = self.review.as_mut() {
                review.accept(column, mapping.source_for(column));
            }
        }
        self.state = ReconciliationState::UnderReview;
        tracing::debug!(session = %self.id, column, accepted, "Recorded decision");
        Ok(())
    }

    /// Finish a review pass.
    ///
    /// Resolves the session when every column is accepted or left unmapped;
    /// otherwise opens a new pass listing the rejected columns and the
    /// source columns available to reassign them.
    pub fn submit(&mut self) -> Result<SubmitOutcome, WorkflowError> {
        if self.state != ReconciliationState::UnderReview {
            return Err(self.invalid("submit"));
        }
        let mapping = self.mapping.as_ref().ok_or_else(|| self.invalid("submit"))?;

        if is_resolved(&self.confirmations, &self.data_model) {
            self.review = None;
            self.state = ReconciliationState::Resolved;
            tracing::info!(session = %self.id, "Mapping resolved");
            return Ok(SubmitOutcome::Resolved);
        }

        let pass = ReviewPass::compute(&self.confirmations, mapping, &self.data_model);
        let outcome = SubmitOutcome::Pending {
            not_valid: pass.not_valid.clone(),
            unreviewed: unreviewed_columns(&self.confirmations, &self.data_model),
            residual_pool: pass.residual_pool.clone(),
        };
        tracing::info!(
            session = %self.id,
            not_valid = pass.not_valid.len(),
            pool = pass.residual_pool.len(),
            "Review pass still open"
        );
        self.review = Some(pass);
        Ok(outcome)
    }

    /// Reassign a rejected column to a source column from the residual pool.
    /// The column must be confirmed again afterwards.
    pub fn override_column(&mut self, column: &str, source: &str) -> Result<(), WorkflowError> {
        if self.state != ReconciliationState::UnderReview {
            return Err(self.invalid("override"));
        }
        let (Some(review), Some(mapping)) = (self.review.as_ref(), self.mapping.as_ref()) else {
            return Err(self.invalid("override"));
        };

        let updated = apply_override(review, mapping, column, source)?;
        self.mapping = Some(updated);
        self.confirmations.clear(column);
        tracing::debug!(session = %self.id, column, source, "Overrode candidate");
        Ok(())
    }

    /// Knowingly leave a column without a source column
    pub fn leave_unmapped(&mut self, column: &str) -> Result<(), WorkflowError> {
        self.expect_reviewable("leave unmapped")?;
        self.expect_column(column)?;
        match self.mapping.as_mut() {
            Some(mapping) => {
                mapping.set(column, None);
            }
            None => return Err(self.invalid("leave unmapped")),
        }
        self.confirmations.mark_unmapped(column);
        if let Some(review) = self.review.as_mut() {
            review.not_valid.retain(|c| c != column);
        }
        self.state = ReconciliationState::UnderReview;
        tracing::debug!(session = %self.id, column, "Left column unmapped");
        Ok(())
    }

    /// Rows for a review table: current assignment and decision per column
    pub fn rows(&self) -> Vec<ReviewRow> {
        let Some(mapping) = self.mapping.as_ref() else {
            return Vec::new();
        };

        mapping
            .iter()
            .map(|entry| ReviewRow {
                column: entry.column.clone(),
                description: self
                    .data_model
                    .description_of(&entry.column)
                    .unwrap_or_default()
                    .to_string(),
                source: entry.source.clone(),
                source_description: entry
                    .source
                    .as_deref()
                    .and_then(|s| self.source().description_of(s))
                    .map(str::to_string),
                confirmed: self.confirmations.decision(&entry.column),
                left_unmapped: self.confirmations.is_left_unmapped(&entry.column),
            })
            .collect()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            state: self.state,
            model: self.model().to_string(),
            source: self.source().label.clone(),
            data_model: self.data_model.label.clone(),
            mapping: self.mapping.clone(),
            confirmations: self.confirmations.clone(),
            review: self.review.clone(),
            rows: self.rows(),
        }
    }

    fn invalid(&self, action: &'static str) -> WorkflowError {
        WorkflowError::InvalidTransition {
            action,
            state: self.state,
        }
    }

    fn expect_reviewable(&self, action: &'static str) -> Result<(), WorkflowError> {
        match self.state {
            ReconciliationState::Proposed | ReconciliationState::UnderReview => Ok(()),
            _ => Err(self.invalid(action)),
        }
    }

    fn expect_column(&self, column: &str) -> Result<(), WorkflowError> {
        if self.data_model.contains(column) {
            Ok(())
        } else {
            Err(WorkflowError::UnknownColumn(column.to_string()))
        }
    }
}
