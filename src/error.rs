//! Typed error surface for board operations.

/// Errors returned by the engine, the service layer, and the SQLite store.
///
/// The drag session controller converts `InvalidDestination` at drop time
/// into a cancel; direct callers of the ordering engine see it typed.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// A destination column's WIP limit would be exceeded by the move.
    /// Rejected before any mutation.
    #[error("column '{status}' is at its WIP limit of {limit}")]
    LimitExceeded { status: String, limit: usize },

    /// Destination index out of bounds or unknown column.
    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("sprint not found: {0}")]
    SprintNotFound(String),

    /// A task may only reference a sprint belonging to its own team.
    #[error("sprint {sprint_id} belongs to team '{sprint_team}', task belongs to team '{task_team}'")]
    TeamMismatch {
        sprint_id: String,
        sprint_team: String,
        task_team: String,
    },

    /// The persistence collaborator failed. The engine performs no retry;
    /// the next authoritative snapshot corrects any divergence.
    #[error("persistence failure: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("migration failure: {0}")]
    Migration(#[from] Box<refinery::Error>),
}

impl From<refinery::Error> for BoardError {
    fn from(err: refinery::Error) -> Self {
        BoardError::Migration(Box::new(err))
    }
}

/// Result type for board operations.
pub type Result<T> = std::result::Result<T, BoardError>;
