//! Service Module
//!
//! Lifecycle operations on tracked jobs.

pub mod job;

pub use job::JobQueue;
