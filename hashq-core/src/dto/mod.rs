//! Data Transfer Objects for the job collaborators
//!
//! Requests handed to the queue and read-only views handed to logging and
//! authorization layers.

pub mod job;
