//! Reconciliation bookkeeping.
//!
//! Pure functions over a [`Mapping`] and the reviewer's decisions. The
//! [`Session`](crate::Session) state machine sequences them; they are exposed
//! on their own for callers that keep state elsewhere.

use crate::error::WorkflowError;
use crate::mapper::Mapping;
use colmatch_core::Schema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Reviewer decisions for the current mapping.
///
/// `decisions` holds accept/reject per data model column; a column with no
/// entry has not been reviewed yet. Columns the reviewer explicitly chose to
/// leave without a source column are tracked apart from decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationState {
    decisions: BTreeMap<String, bool>,
    left_unmapped: BTreeSet<String>,
}

impl ConfirmationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decision(&self, column: &str) -> Option<bool> {
        self.decisions.get(column).copied()
    }

    pub fn is_left_unmapped(&self, column: &str) -> bool {
        self.left_unmapped.contains(column)
    }

    pub fn decisions(&self) -> &BTreeMap<String, bool> {
        &self.decisions
    }

    pub fn left_unmapped(&self) -> &BTreeSet<String> {
        &self.left_unmapped
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty() && self.left_unmapped.is_empty()
    }

    pub fn set(&mut self, column: &str, accepted: bool) {
        self.left_unmapped.remove(column);
        self.decisions.insert(column.to_string(), accepted);
    }

    /// Forget any decision for `column`; it has to be reviewed again
    pub fn clear(&mut self, column: &str) {
        self.decisions.remove(column);
        self.left_unmapped.remove(column);
    }

    pub fn mark_unmapped(&mut self, column: &str) {
        self.decisions.remove(column);
        self.left_unmapped.insert(column.to_string());
    }

    pub fn reset(&mut self) {
        self.decisions.clear();
        self.left_unmapped.clear();
    }
}

/// Outcome of a submit that did not resolve every column.
///
/// `residual_pool` is a snapshot of the source columns assigned to the
/// not-valid columns at submit time. Overrides during this pass choose from
/// it, so two rejected columns can trade candidates. A source confirmed for
/// some column is never in the pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPass {
    pub not_valid: Vec<String>,
    pub residual_pool: Vec<String>,
}

impl ReviewPass {
    pub fn compute(state: &ConfirmationState, mapping: &Mapping, data_model: &Schema) -> Self {
        let not_valid = not_valid_columns(state, data_model);
        let residual_pool = pool_for(&not_valid, state, mapping);
        Self {
            not_valid,
            residual_pool,
        }
    }

    pub fn is_not_valid(&self, column: &str) -> bool {
        self.not_valid.iter().any(|c| c == column)
    }

    pub fn in_pool(&self, source: &str) -> bool {
        self.residual_pool.iter().any(|s| s == source)
    }

    /// `column` was accepted with `source` during this pass: it leaves the
    /// not-valid set and `source` can no longer be picked for another column
    pub fn accept(&mut self, column: &str, source: Option<&str>) {
        self.not_valid.retain(|c| c != column);
        if let Some(source) = source {
            self.residual_pool.retain(|s| s != source);
        }
    }
}

/// Record one accept/reject decision, returning the updated state
pub fn record_confirmation(state: &ConfirmationState, column: &str, accepted: bool) -> ConfirmationState {
    let mut next = state.clone();
    next.set(column, accepted);
    next
}

/// Columns explicitly rejected, in data model order
pub fn not_valid_columns(state: &ConfirmationState, data_model: &Schema) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for name in data_model.names() {
        if state.decision(name) == Some(false) && !columns.iter().any(|c| c == name) {
            columns.push(name.to_string());
        }
    }
    columns
}

/// Columns with no decision that were not left unmapped either
pub fn unreviewed_columns(state: &ConfirmationState, data_model: &Schema) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for name in data_model.names() {
        if state.decision(name).is_none()
            && !state.is_left_unmapped(name)
            && !columns.iter().any(|c| c == name)
        {
            columns.push(name.to_string());
        }
    }
    columns
}

/// Source columns currently assigned to some rejected column and not
/// confirmed for any other column
pub fn residual_pool(state: &ConfirmationState, mapping: &Mapping, data_model: &Schema) -> Vec<String> {
    pool_for(&not_valid_columns(state, data_model), state, mapping)
}

fn pool_for(not_valid: &[String], state: &ConfirmationState, mapping: &Mapping) -> Vec<String> {
    let confirmed: Vec<&str> = state
        .decisions()
        .iter()
        .filter(|(_, accepted)| **accepted)
        .filter_map(|(column, _)| mapping.source_for(column))
        .collect();

    let mut pool: Vec<String> = Vec::new();
    for column in not_valid {
        if let Some(source) = mapping.source_for(column) {
            if !confirmed.contains(&source) && !pool.iter().any(|s| s == source) {
                pool.push(source.to_string());
            }
        }
    }
    pool
}

/// Reassign a rejected column to a source column from the residual pool.
///
/// Returns the updated mapping; `pass` and `mapping` are not modified, so a
/// rejected override leaves everything as it was.
pub fn apply_override(
    pass: &ReviewPass,
    mapping: &Mapping,
    column: &str,
    new_target: &str,
) -> Result<Mapping, WorkflowError> {
    if !pass.is_not_valid(column) {
        return Err(WorkflowError::NotInvalid(column.to_string()));
    }
    if !pass.in_pool(new_target) {
        return Err(WorkflowError::CandidateNotInPool {
            column: column.to_string(),
            candidate: new_target.to_string(),
        });
    }

    let mut next = mapping.clone();
    if !next.set(column, Some(new_target.to_string())) {
        return Err(WorkflowError::UnknownColumn(column.to_string()));
    }
    Ok(next)
}

/// True when every data model column is accepted or knowingly left unmapped
pub fn is_resolved(state: &ConfirmationState, data_model: &Schema) -> bool {
    data_model
        .names()
        .all(|name| state.decision(name) == Some(true) || state.is_left_unmapped(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::MappingEntry;
    use colmatch_core::ColumnRecord;

    fn data_model() -> Schema {
        Schema::new(
            "dm",
            vec![
                ColumnRecord::new("a", "alpha"),
                ColumnRecord::new("b", "beta"),
                ColumnRecord::new("c", "gamma"),
            ],
        )
    }

    fn mapping() -> Mapping {
        Mapping::new(vec![
            MappingEntry { column: "a".to_string(), source: Some("x".to_string()) },
            MappingEntry { column: "b".to_string(), source: Some("y".to_string()) },
            MappingEntry { column: "c".to_string(), source: Some("x".to_string()) },
        ])
    }

    #[test]
    fn test_record_confirmation_is_pure() {
        let empty = ConfirmationState::new();
        let next = record_confirmation(&empty, "a", true);
        assert!(empty.is_empty());
        assert_eq!(next.decision("a"), Some(true));
        assert_eq!(next.decision("b"), None);
    }

    #[test]
    fn test_is_resolved() {
        let dm = data_model();
        let mut state = ConfirmationState::new();
        assert!(!is_resolved(&state, &dm));

        state.set("a", true);
        state.set("b", true);
        assert!(!is_resolved(&state, &dm));

        state.set("c", false);
        assert!(!is_resolved(&state, &dm));

        state.mark_unmapped("c");
        assert!(is_resolved(&state, &dm));
    }

    #[test]
    fn test_not_valid_is_exactly_rejected() {
        let dm = data_model();
        let mut state = ConfirmationState::new();
        state.set("c", false);
        state.set("a", false);
        state.set("b", true);

        // data model order, not decision order
        assert_eq!(not_valid_columns(&state, &dm), vec!["a", "c"]);
        assert!(unreviewed_columns(&state, &dm).is_empty());
    }

    #[test]
    fn test_residual_pool_deduplicates() {
        let dm = data_model();
        let mut state = ConfirmationState::new();
        state.set("a", false);
        state.set("b", true);
        state.set("c", false);
        assert_eq!(residual_pool(&state, &mapping(), &dm), vec!["x"]);

        state.set("b", false);
        assert_eq!(residual_pool(&state, &mapping(), &dm), vec!["x", "y"]);
    }

    #[test]
    fn test_residual_pool_skips_confirmed_sources() {
        let dm = data_model();
        let mut state = ConfirmationState::new();
        state.set("a", true);
        state.set("c", false);
        // c was proposed x, which a already holds
        assert!(residual_pool(&state, &mapping(), &dm).is_empty());

        let mut pass = ReviewPass::compute(&state, &mapping(), &dm);
        assert!(apply_override(&pass, &mapping(), "c", "x").is_err());

        state.set("a", false);
        state.set("b", false);
        pass = ReviewPass::compute(&state, &mapping(), &dm);
        assert_eq!(pass.residual_pool, vec!["x", "y"]);

        pass.accept("b", Some("y"));
        assert_eq!(pass.not_valid, vec!["a", "c"]);
        assert_eq!(pass.residual_pool, vec!["x"]);
        assert_eq!(
            apply_override(&pass, &mapping(), "a", "y"),
            Err(WorkflowError::CandidateNotInPool {
                column: "a".to_string(),
                candidate: "y".to_string()
            })
        );
    }

    #[test]
    fn test_apply_override() {
        let dm = data_model();
        let mut state = ConfirmationState::new();
        state.set("a", false);
        state.set("b", false);
        state.set("c", false);
        let pass = ReviewPass::compute(&state, &mapping(), &dm);
        assert_eq!(pass.residual_pool, vec!["x", "y"]);

        let updated = apply_override(&pass, &mapping(), "a", "y").unwrap();
        assert_eq!(updated.source_for("a"), Some("y"));
        assert_eq!(updated.source_for("b"), Some("y"));
    }

    #[test]
    fn test_override_rejections() {
        let dm = data_model();
        let mut state = ConfirmationState::new();
        state.set("a", false);
        state.set("c", true);
        let pass = ReviewPass::compute(&state, &mapping(), &dm);

        assert_eq!(
            apply_override(&pass, &mapping(), "c", "x"),
            Err(WorkflowError::NotInvalid("c".to_string()))
        );
        assert_eq!(
            apply_override(&pass, &mapping(), "a", "y"),
            Err(WorkflowError::CandidateNotInPool {
                column: "a".to_string(),
                candidate: "y".to_string()
            })
        );
    }

    #[test]
    fn test_mark_unmapped_replaces_decision() {
        let mut state = ConfirmationState::new();
        state.set("a", false);
        state.mark_unmapped("a");
        assert_eq!(state.decision("a"), None);
        assert!(state.is_left_unmapped("a"));

        state.set("a", true);
        assert!(!state.is_left_unmapped("a"));
    }
}
