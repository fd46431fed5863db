//! Core domain types
//!
//! The job record shared between the submission side (creates jobs), the
//! queue (owns their lifecycle) and any lower-trust consumer (reads the
//! sanitized view).

pub mod id;
pub mod job;
pub mod sanitize;
