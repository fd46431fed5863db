//! Job Service
//!
//! Owns job lifecycles: submission, assignment, status transitions,
//! progress and result recording, and removal of expired jobs.
//!
//! Every log line goes through the sanitizer; raw parameters are never
//! emitted.

use chrono::{DateTime, TimeDelta, Utc};
use hashq_core::domain::id::{IdGenerator, JobId, UuidV4Generator};
use hashq_core::domain::job::{Job, JobStatus};
use hashq_core::domain::sanitize::ParameterSanitizer;
use hashq_core::dto::job::{CreateJob, JobLogView, ProgressUpdate, StatusUpdate};
use hashq_core::CoreError;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::QueueConfig;
use crate::error::{QueueError, Result};
use crate::repository::JobRepository;

/// Job lifecycle service
pub struct JobQueue {
    repository: Arc<dyn JobRepository>,
    ids: Arc<dyn IdGenerator>,
    sanitizer: ParameterSanitizer,
    purge_after: TimeDelta,
}

impl JobQueue {
    /// Creates a queue issuing random UUID identifiers
    pub fn new(repository: Arc<dyn JobRepository>, config: &QueueConfig) -> Self {
        Self::with_id_generator(repository, Arc::new(UuidV4Generator), config)
    }

    /// Creates a queue with a specific identifier generator
    pub fn with_id_generator(
        repository: Arc<dyn JobRepository>,
        ids: Arc<dyn IdGenerator>,
        config: &QueueConfig,
    ) -> Self {
        Self {
            repository,
            ids,
            sanitizer: config.sanitizer(),
            purge_after: TimeDelta::from_std(config.purge_after).unwrap_or(TimeDelta::MAX),
        }
    }

    pub fn sanitizer(&self) -> &ParameterSanitizer {
        &self.sanitizer
    }

    /// Builds and tracks a new job
    pub fn submit(&self, req: CreateJob) -> Result<Job> {
        let mut job = Job::create_with(
            self.ids.as_ref(),
            req.tool_id,
            req.name,
            req.owner,
            req.parameters,
        )?;
        job.visible_to_teams = req.visible_to_teams;
        job.started_at = Some(Utc::now());

        self.repository.insert(job.clone())?;

        let view = JobLogView::new(&job, &self.sanitizer);
        info!(
            job_id = %view.id,
            tool_id = %view.tool_id,
            owner = %view.owner,
            parameters = ?view.parameters,
            "Job submitted"
        );

        Ok(job)
    }

    /// Tracks a job built elsewhere (e.g. restored from storage)
    pub fn import(&self, job: Job) -> Result<Job> {
        if job.id().is_empty() {
            return Err(CoreError::MissingId.into());
        }
        job.validate()?;

        self.repository.insert(job.clone())?;
        debug!(job_id = %job.id(), status = ?job.status(), "Job imported");

        Ok(job)
    }

    /// Snapshot of a job
    pub fn get(&self, id: &JobId) -> Result<Job> {
        self.repository
            .get(id)
            .ok_or_else(|| QueueError::NotFound(id.clone()))
    }

    /// Log-safe view of a job
    pub fn log_view(&self, id: &JobId) -> Result<JobLogView> {
        let job = self.get(id)?;
        Ok(JobLogView::new(&job, &self.sanitizer))
    }

    /// All tracked jobs, oldest first
    pub fn list(&self) -> Vec<Job> {
        self.repository.list()
    }

    pub fn list_by_status(&self, status: JobStatus) -> Vec<Job> {
        self.repository
            .list()
            .into_iter()
            .filter(|job| job.status() == Some(status))
            .collect()
    }

    /// Records the resource executing a job
    pub fn assign(&self, id: &JobId, resource: impl Into<String>) -> Result<Job> {
        let resource = resource.into();
        let job = self.mutate(id, |job| {
            if let Some(status) = job.status().filter(|s| s.is_terminal()) {
                return Err(CoreError::TerminalState(status));
            }
            job.assigned_resource = resource.clone();
            Ok(())
        })?;

        info!(job_id = %id, resource = %job.assigned_resource, "Job assigned");
        Ok(job)
    }

    /// Moves a job to `Running`; `running_since` is set on the first start only
    pub fn start(&self, id: &JobId) -> Result<Job> {
        self.set_status(id, JobStatus::Running, Utc::now())
    }

    pub fn pause(&self, id: &JobId) -> Result<Job> {
        self.set_status(id, JobStatus::Paused, Utc::now())
    }

    pub fn resume(&self, id: &JobId) -> Result<Job> {
        self.start(id)
    }

    pub fn complete(&self, id: &JobId) -> Result<Job> {
        self.set_status(id, JobStatus::Done, Utc::now())
    }

    pub fn cancel(&self, id: &JobId) -> Result<Job> {
        self.set_status(id, JobStatus::Cancelled, Utc::now())
    }

    /// Records a tool failure and moves the job to `Failed`
    pub fn fail(&self, id: &JobId, error: impl Into<String>) -> Result<Job> {
        self.apply_status_update(StatusUpdate {
            job_id: id.clone(),
            status: JobStatus::Failed,
            timestamp: Utc::now(),
            error: Some(error.into()),
        })
    }

    /// Applies a status report from the executing side
    pub fn apply_status_update(&self, update: StatusUpdate) -> Result<Job> {
        let purge_after = self.purge_after;
        let job = self.mutate(&update.job_id, |job| {
            apply_status(job, update.status, update.timestamp, purge_after)?;
            if let Some(error) = &update.error {
                job.last_error = error.clone();
            }
            Ok(())
        })?;

        if let Some(error) = &update.error {
            warn!(job_id = %update.job_id, status = %update.status, error = %error, "Job reported an error");
        } else {
            info!(job_id = %update.job_id, status = %update.status, "Job status changed");
        }
        Ok(job)
    }

    /// Applies a progress report; absent fields are left untouched
    pub fn record_progress(&self, update: ProgressUpdate) -> Result<Job> {
        let job = self.mutate(&update.job_id, |job| {
            if let Some(units) = update.units_completed {
                job.units_completed = units;
            }
            if let Some(units) = update.units_total {
                job.units_total = units;
            }
            if let Some(progress) = update.progress {
                job.set_progress(progress)?;
            }
            if let Some(estimate) = &update.estimated_completion {
                job.estimated_completion = estimate.clone();
            }
            Ok(())
        })?;

        debug!(
            job_id = %update.job_id,
            units_completed = job.units_completed,
            units_total = job.units_total,
            progress = job.progress(),
            "Job progress"
        );
        Ok(job)
    }

    /// Appends one sample to a job's performance series
    pub fn record_performance(
        &self,
        id: &JobId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Job> {
        let key = key.into();
        let value = value.into();
        self.mutate(id, |job| job.record_performance(key.clone(), value.clone()))
    }

    /// Sets the label of a job's performance series
    pub fn set_performance_label(&self, id: &JobId, label: impl Into<String>) -> Result<Job> {
        let label = label.into();
        self.mutate(id, |job| {
            job.performance_label = label.clone();
            Ok(())
        })
    }

    /// Replaces a job's result table
    pub fn set_output(
        &self,
        id: &JobId,
        titles: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Result<Job> {
        self.mutate(id, |job| job.set_output(titles.clone(), rows.clone()))
    }

    /// Appends one row to a job's result table
    pub fn push_output_row(&self, id: &JobId, row: Vec<String>) -> Result<Job> {
        self.mutate(id, |job| job.push_output_row(row.clone()))
    }

    /// Stops tracking every job whose purge time is at or before `now`
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Vec<JobId> {
        let expired: Vec<JobId> = self
            .repository
            .list()
            .into_iter()
            .filter(|job| job.purge_at.is_some_and(|at| at <= now))
            .map(|job| job.id().clone())
            .collect();

        let mut purged = Vec::with_capacity(expired.len());
        for id in expired {
            if self.repository.remove(&id).is_some() {
                info!(job_id = %id, "Job purged");
                purged.push(id);
            }
        }
        purged
    }

    fn set_status(&self, id: &JobId, status: JobStatus, at: DateTime<Utc>) -> Result<Job> {
        self.apply_status_update(StatusUpdate {
            job_id: id.clone(),
            status,
            timestamp: at,
            error: None,
        })
    }

    fn mutate<F>(&self, id: &JobId, mut mutation: F) -> Result<Job>
    where
        F: FnMut(&mut Job) -> hashq_core::Result<()>,
    {
        self.repository.update(id, &mut mutation)
    }
}

fn apply_status(
    job: &mut Job,
    status: JobStatus,
    at: DateTime<Utc>,
    purge_after: TimeDelta,
) -> hashq_core::Result<()> {
    job.transition_to(status)?;
    if status == JobStatus::Running && job.running_since.is_none() {
        job.running_since = Some(at);
    }
    if status.is_terminal() {
        job.purge_at = at.checked_add_signed(purge_after);
    }
    Ok(())
}
