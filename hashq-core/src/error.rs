//! Error types for the hashq core

use thiserror::Error;

use crate::domain::job::JobStatus;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by job construction and lifecycle mutations
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// The identifier generator could not produce an id
    #[error("Failed to generate job identifier: {0}")]
    IdGeneration(String),

    /// A status string did not name a known state
    #[error("Unknown job status: {0:?}")]
    UnknownStatus(String),

    /// The requested status change is not allowed
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: JobStatus,
        /// Requested status
        to: JobStatus,
    },

    /// The job already reached a terminal state
    #[error("Job is in terminal state {0} and cannot change status")]
    TerminalState(JobStatus),

    /// Progress outside [0.0, 1.0] (or NaN)
    #[error("Progress {0} is outside the range [0.0, 1.0]")]
    ProgressOutOfRange(f64),

    /// A row or the title list does not match the table's column count
    #[error("Output shape mismatch: expected {expected} column(s), got {actual}")]
    OutputShape {
        /// Column count established by the titles
        expected: usize,
        /// Column count of the offending row or title list
        actual: usize,
    },

    /// The performance series is append-only
    #[error("Performance sample {0:?} already recorded")]
    DuplicatePerformanceSample(String),

    /// A job carries lifecycle state but no identifier
    #[error("Job has a status but no identifier")]
    MissingId,
}
