//! Job Repository
//!
//! Keeps tracked jobs in memory. The index and every job have their own
//! lock, so a long mutation of one job never blocks reads of another, and
//! reads of a job only wait for the one mutation in flight.

use hashq_core::domain::id::JobId;
use hashq_core::domain::job::Job;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{QueueError, Result};

/// Mutation applied to a job under its write lock
pub type JobMutation<'a> = &'a mut dyn FnMut(&mut Job) -> hashq_core::Result<()>;

/// Storage for tracked jobs
pub trait JobRepository: Send + Sync {
    /// Starts tracking a job; its id must not be tracked already
    fn insert(&self, job: Job) -> Result<()>;

    /// Snapshot of a job
    fn get(&self, id: &JobId) -> Option<Job>;

    /// Snapshots of all tracked jobs, oldest first
    fn list(&self) -> Vec<Job>;

    /// Applies `mutation` atomically and returns the updated snapshot
    ///
    /// The mutation runs on a copy; the stored job only changes if it
    /// returns `Ok`.
    fn update(&self, id: &JobId, mutation: JobMutation<'_>) -> Result<Job>;

    /// Stops tracking a job
    fn remove(&self, id: &JobId) -> Option<Job>;
}

/// In-memory implementation of JobRepository
///
/// Lock poisoning is recovered: a mutation only ever stores a fully
/// validated job, so the last stored value is always consistent.
#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<JobId, Arc<RwLock<Job>>>>,
}

impl InMemoryJobRepository {
    /// Creates an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, id: &JobId) -> Option<Arc<RwLock<Job>>> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.get(id).cloned()
    }
}

impl JobRepository for InMemoryJobRepository {
    fn insert(&self, job: Job) -> Result<()> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let id = job.id().clone();
        if jobs.contains_key(&id) {
            return Err(QueueError::Duplicate(id));
        }
        jobs.insert(id, Arc::new(RwLock::new(job)));
        Ok(())
    }

    fn get(&self, id: &JobId) -> Option<Job> {
        let entry = self.entry(id)?;
        let job = entry.read().unwrap_or_else(PoisonError::into_inner);
        Some(job.clone())
    }

    fn list(&self) -> Vec<Job> {
        let entries: Vec<_> = {
            let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
            jobs.values().cloned().collect()
        };

        let mut snapshots: Vec<Job> = entries
            .iter()
            .map(|entry| entry.read().unwrap_or_else(PoisonError::into_inner).clone())
            .collect();
        snapshots.sort_by(|a, b| {
            a.started_at
                .cmp(&b.started_at)
                .then_with(|| a.id().cmp(b.id()))
        });
        snapshots
    }

    fn update(&self, id: &JobId, mutation: JobMutation<'_>) -> Result<Job> {
        let entry = self
            .entry(id)
            .ok_or_else(|| QueueError::NotFound(id.clone()))?;
        let mut job = entry.write().unwrap_or_else(PoisonError::into_inner);

        let mut draft = job.clone();
        mutation(&mut draft)?;
        *job = draft;

        Ok(job.clone())
    }

    fn remove(&self, id: &JobId) -> Option<Job> {
        let entry = {
            let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
            jobs.remove(id)?
        };
        let job = entry.read().unwrap_or_else(PoisonError::into_inner);
        Some(job.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashq_core::CoreError;
    use hashq_core::domain::job::JobStatus;

    fn new_job(name: &str) -> Job {
        Job::new("tool", name, "alice", HashMap::new())
    }

    #[test]
    fn test_insert_and_get() {
        let repo = InMemoryJobRepository::new();
        let job = new_job("a");
        let id = job.id().clone();

        repo.insert(job.clone()).unwrap();

        assert_eq!(repo.get(&id), Some(job));
        assert!(repo.get(&JobId::new("missing")).is_none());
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let repo = InMemoryJobRepository::new();
        let job = new_job("a");

        repo.insert(job.clone()).unwrap();
        let err = repo.insert(job).unwrap_err();
        assert!(matches!(err, QueueError::Duplicate(_)));
    }

    #[test]
    fn test_update_is_all_or_nothing() {
        let repo = InMemoryJobRepository::new();
        let job = new_job("a");
        let id = job.id().clone();
        repo.insert(job).unwrap();

        let err = repo
            .update(&id, &mut |job: &mut Job| {
                job.assigned_resource = "gpu-01".to_string();
                job.set_progress(7.0)
            })
            .unwrap_err();
        assert!(matches!(err, QueueError::Core(CoreError::ProgressOutOfRange(_))));
        assert_eq!(repo.get(&id).unwrap().assigned_resource, "");

        let updated = repo
            .update(&id, &mut |job: &mut Job| job.transition_to(JobStatus::Running))
            .unwrap();
        assert_eq!(updated.status(), Some(JobStatus::Running));
    }

    #[test]
    fn test_update_missing_job() {
        let repo = InMemoryJobRepository::new();
        let err = repo
            .update(&JobId::new("nope"), &mut |_: &mut Job| Ok(()))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_snapshots_are_detached() {
        let repo = InMemoryJobRepository::new();
        let job = new_job("a");
        let id = job.id().clone();
        repo.insert(job).unwrap();

        let mut snapshot = repo.get(&id).unwrap();
        snapshot.name = "changed".to_string();
        snapshot.parameters.insert("k".to_string(), "v".to_string());

        let stored = repo.get(&id).unwrap();
        assert_eq!(stored.name, "a");
        assert!(stored.parameters.is_empty());
    }

    #[test]
    fn test_remove() {
        let repo = InMemoryJobRepository::new();
        let job = new_job("a");
        let id = job.id().clone();
        repo.insert(job).unwrap();

        assert!(repo.remove(&id).is_some());
        assert!(repo.remove(&id).is_none());
        assert!(repo.list().is_empty());
    }

    #[test]
    fn test_concurrent_updates_are_serialized() {
        let repo = Arc::new(InMemoryJobRepository::new());
        let job = new_job("a");
        let id = job.id().clone();
        repo.insert(job).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = Arc::clone(&repo);
                let id = id.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        repo.update(&id, &mut |job: &mut Job| {
                            job.units_completed += 1;
                            Ok(())
                        })
                        .unwrap();
                        let _ = repo.get(&id).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(repo.get(&id).unwrap().units_completed, 800);
    }
}
