//! Error types for reconciliation actions.

use crate::session::ReconciliationState;
use thiserror::Error;

/// A workflow action that is not allowed in the current session state.
///
/// These are local validation failures: the session is left exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: ReconciliationState,
    },

    #[error("Unknown data model column: {0}")]
    UnknownColumn(String),

    #[error("Column '{0}' is not in the not-valid set")]
    NotInvalid(String),

    #[error("Source column '{candidate}' is not an open candidate for '{column}'")]
    CandidateNotInPool { column: String, candidate: String },

    #[error("Column '{0}' has no source column to confirm")]
    Unmapped(String),
}
