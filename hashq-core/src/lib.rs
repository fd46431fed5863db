//! Hashq Core
//!
//! Job record model and lifecycle contract for the hashq task queue.
//!
//! This crate contains:
//! - Domain types: the Job entity, its status machine, identifier generation
//!   and the parameter sanitizer
//! - DTOs: request and view types handed to the queue, logging and
//!   authorization collaborators

pub mod domain;
pub mod dto;
pub mod error;

pub use error::{CoreError, Result};
