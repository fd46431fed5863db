//! Job identifiers
//!
//! A job id is an opaque string assigned once when the job is created.
//! Generation is a pluggable capability so the queue can pick random,
//! time-ordered or (for tests and replay) counter-based ids.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::error::Result;

/// Globally unique job identifier
///
/// The empty id is the zero value carried by jobs built with
/// [`Job::create_empty`](crate::domain::job::Job::create_empty).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wraps an existing identifier string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns true if no identifier has been assigned
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for JobId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Source of job identifiers
///
/// Implementations must never hand out the same id twice within a process
/// and must be callable concurrently.
pub trait IdGenerator: Send + Sync {
    /// Produces a fresh identifier
    fn generate(&self) -> Result<JobId>;
}

/// Random 128-bit identifiers (UUID v4)
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4Generator;

impl IdGenerator for UuidV4Generator {
    fn generate(&self) -> Result<JobId> {
        Ok(Uuid::new_v4().into())
    }
}

/// Time-ordered identifiers (UUID v7)
///
/// Ids sort by creation time, which keeps listings in submission order.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn generate(&self) -> Result<JobId> {
        Ok(Uuid::now_v7().into())
    }
}

/// Next value handed out by any [`SequentialGenerator`]
static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Counter-based identifiers of the form `{prefix}-{n}`
///
/// All instances draw from one process-wide counter, so ids stay unique
/// across generators even when they share a prefix.
#[derive(Debug, Clone)]
pub struct SequentialGenerator {
    prefix: String,
}

impl SequentialGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl IdGenerator for SequentialGenerator {
    fn generate(&self) -> Result<JobId> {
        let n = NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Ok(JobId(format!("{}-{}", self.prefix, n)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_default_id_is_empty() {
        let id = JobId::default();
        assert!(id.is_empty());
        assert_eq!(id.as_str(), "");
    }

    #[test]
    fn test_uuid_generators_produce_distinct_ids() {
        let v4 = UuidV4Generator;
        let v7 = UuidV7Generator;

        let mut seen = HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(v4.generate().unwrap()));
            assert!(seen.insert(v7.generate().unwrap()));
        }
    }

    #[test]
    fn test_uuid_v7_ids_are_time_ordered() {
        let generator = UuidV7Generator;
        let first = generator.generate().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = generator.generate().unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_sequential_generator_format() {
        let generator = SequentialGenerator::new("job");
        let first = generator.generate().unwrap();
        let second = generator.generate().unwrap();

        let n1: u64 = first.as_str().strip_prefix("job-").unwrap().parse().unwrap();
        let n2: u64 = second.as_str().strip_prefix("job-").unwrap().parse().unwrap();
        assert!(n1 >= 1);
        assert!(n2 > n1);
    }

    #[test]
    fn test_sequential_generators_share_one_counter() {
        let a = SequentialGenerator::new("job");
        let b = SequentialGenerator::new("job");

        let mut seen = HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(a.generate().unwrap()));
            assert!(seen.insert(b.generate().unwrap()));
        }
    }

    #[test]
    fn test_sequential_generator_is_safe_across_threads() {
        let generator = Arc::new(SequentialGenerator::new("t"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || {
                    (0..250)
                        .map(|_| generator.generate().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 2000);
    }

    #[test]
    fn test_job_id_serializes_as_plain_string() {
        let id = JobId::new("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
