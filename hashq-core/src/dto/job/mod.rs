//! Job DTOs for the queue, logging and authorization collaborators

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::id::JobId;
use crate::domain::job::{Job, JobStatus};
use crate::domain::sanitize::ParameterSanitizer;

/// Request to submit a new job
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateJob {
    pub tool_id: String,
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub visible_to_teams: Vec<String>,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

/// Status change reported by the executing side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub job_id: JobId,
    pub status: JobStatus,
    pub timestamp: DateTime<Utc>,
    /// Tool error to record alongside the new status
    pub error: Option<String>,
}

/// Progress report from the executing side
///
/// Every field is optional; absent fields leave the job untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub job_id: JobId,
    pub units_completed: Option<u64>,
    pub units_total: Option<u64>,
    pub progress: Option<f64>,
    pub estimated_completion: Option<String>,
}

/// Job view that is safe to hand to logs and telemetry
///
/// Can only be built from a [`Job`] through a sanitizer, so denylisted
/// parameters never reach it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobLogView {
    pub id: JobId,
    pub tool_id: String,
    pub name: String,
    pub status: Option<JobStatus>,
    pub owner: String,
    pub assigned_resource: String,
    pub progress: f64,
    pub parameters: HashMap<String, String>,
}

impl JobLogView {
    pub fn new(job: &Job, sanitizer: &ParameterSanitizer) -> Self {
        Self {
            id: job.id().clone(),
            tool_id: job.tool_id.clone(),
            name: job.name.clone(),
            status: job.status(),
            owner: job.owner.clone(),
            assigned_resource: job.assigned_resource.clone(),
            progress: job.progress(),
            parameters: sanitizer.sanitize(job),
        }
    }
}

impl From<&Job> for JobLogView {
    fn from(job: &Job) -> Self {
        Self::new(job, &ParameterSanitizer::default())
    }
}

/// The fields an authorization layer needs to decide read access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobVisibility {
    pub id: JobId,
    pub owner: String,
    /// Empty means owner-only
    pub visible_to_teams: Vec<String>,
}

impl From<&Job> for JobVisibility {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id().clone(),
            owner: job.owner.clone(),
            visible_to_teams: job.visible_to_teams.clone(),
        }
    }
}
