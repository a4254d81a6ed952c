//! Core error types
//!
//! One error enum for the orchestration core. Collaborator failures
//! (storage, covenant, LLM backends) are wrapped rather than leaked.

use thiserror::Error;

/// Errors surfaced by the orchestration core
#[derive(Debug, Error)]
pub enum CoreError {
    /// Task dependency graph contains a cycle - configuration error,
    /// raised at schedule time, never retried
    #[error("dependency cycle detected involving task {0}")]
    CycleDetected(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("goal not found: {0}")]
    GoalNotFound(String),

    /// Attempt to advance a goal the covenant never approved
    #[error("covenant rejected: {0}")]
    CovenantRejected(String),

    /// All routing candidates failed or none matched the constraints
    #[error("service error: {0}")]
    Service(String),

    /// Persistence delegate failure
    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CoreError {
    /// Whether the caller may reasonably retry the operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Service(_) | CoreError::Storage(_))
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(e: rusqlite::Error) -> Self {
        CoreError::Storage(e.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
