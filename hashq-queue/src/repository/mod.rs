//! Repository Module
//!
//! Storage for tracked jobs. Each job has a single writer at a time and
//! readers always receive owned snapshots.

pub mod job;

pub use job::{InMemoryJobRepository, JobRepository};
