//! Hashq Queue
//!
//! In-memory owner of job lifecycles.
//!
//! Architecture:
//! - Configuration: retention, keeper interval and extra sensitive keys
//! - Repository: job storage with one writer per job and snapshot reads
//! - Service: lifecycle operations (submit, assign, status, progress, results)
//! - Keeper: background task removing jobs whose purge time has passed
//!
//! Which resource runs which job is decided by the caller; this crate only
//! records the assignment.

pub mod config;
pub mod error;
pub mod keeper;
pub mod repository;
pub mod service;

pub use config::QueueConfig;
pub use error::{QueueError, Result};
pub use keeper::Keeper;
pub use repository::{InMemoryJobRepository, JobRepository};
pub use service::JobQueue;
