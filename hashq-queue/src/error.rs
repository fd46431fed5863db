//! Error types for the job queue

use hashq_core::CoreError;
use hashq_core::domain::id::JobId;
use thiserror::Error;

/// Result type alias for queue operations
pub type Result<T> = std::result::Result<T, QueueError>;

/// Errors that can occur when operating on the queue
#[derive(Debug, Error)]
pub enum QueueError {
    /// No job with this id is tracked
    #[error("Job not found: {0}")]
    NotFound(JobId),

    /// A job with this id is already tracked
    #[error("Job already exists: {0}")]
    Duplicate(JobId),

    /// The job rejected the mutation
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl QueueError {
    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
