// ABOUTME: Error types for task operations
// ABOUTME: Fatal operation errors and recoverable per-row import errors

use std::fmt;

use tasklane_storage::StorageError;
use thiserror::Error;

/// Errors that abort a whole task operation
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Unsupported file format '{file_name}'. Only CSV and Excel files are allowed")]
    UnsupportedFormat { file_name: String },
    #[error("No active sub-agents available for task distribution")]
    NoEligibleAssignees,
    #[error("Title is required")]
    MissingTitle,
    #[error("Duplicate task \"{title}\" found for this agent")]
    DuplicateTask { title: String },
    #[error("Please confirm duplicate removal by setting confirm: true")]
    ConfirmationRequired,
    #[error("Agent not found: {0}")]
    CreatorNotFound(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Invalid assignment or not authorized")]
    InvalidAssignment,
    #[error("Failed to parse file: {0}")]
    Parse(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TaskResult<T> = Result<T, TaskError>;

impl TaskError {
    pub(crate) fn task_not_found() -> Self {
        TaskError::NotFound("Task not found or not authorized".to_string())
    }
}

/// A single row that could not be turned into a task; the batch continues
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("Title is required")]
    MissingTitle,
    #[error("Duplicate task \"{title}\" for {assignee}")]
    DuplicateRow { title: String, assignee: String },
    #[error("{0}")]
    Storage(String),
}

/// Row-level failure tagged with its 1-based row number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub row: usize,
    pub error: RowError,
}

impl RowFailure {
    /// `index` is the zero-based position of the row in the parsed file
    pub fn new(index: usize, error: RowError) -> Self {
        Self {
            row: index + 1,
            error,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self.error, RowError::DuplicateRow { .. })
    }
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.error)
    }
}
