//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::domain::id::{IdGenerator, JobId};
use crate::error::{CoreError, Result};

/// Job record
///
/// One unit of work submitted for an external tool, together with its
/// execution metadata and results. Built by the submission side, then owned
/// and updated by the queue.
///
/// Fields that carry an invariant (`id`, `status`, `progress`, the
/// performance series and the output table) are private and only change
/// through validating methods. Records obtained by deserialization should
/// be checked with [`Job::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    id: JobId,
    pub tool_id: String,
    pub name: String,
    status: Option<JobStatus>,
    pub last_error: String,
    pub started_at: Option<DateTime<Utc>>,
    pub purge_at: Option<DateTime<Utc>>,
    pub running_since: Option<DateTime<Utc>>,
    pub estimated_completion: String,
    pub owner: String,
    pub visible_to_teams: Vec<String>,
    pub assigned_resource: String,
    pub units_completed: u64,
    pub units_total: u64,
    progress: f64,
    pub parameters: HashMap<String, String>,
    performance_series: BTreeMap<String, String>,
    pub performance_label: String,
    output_rows: Vec<Vec<String>>,
    output_titles: Vec<String>,
}

/// Job lifecycle status
///
/// Deserialized through [`FromStr`](std::str::FromStr), so records accept
/// the same names as the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum JobStatus {
    Created,
    Running,
    Paused,
    Done,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Created,
        JobStatus::Running,
        JobStatus::Paused,
        JobStatus::Done,
        JobStatus::Failed,
        JobStatus::Cancelled,
    ];

    /// Terminal states are final
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed | JobStatus::Cancelled)
    }

    /// Checks a status change against the lifecycle rules
    ///
    /// Nothing leaves a terminal state and nothing returns to `Created`.
    /// Staying in the same non-terminal state is accepted as a no-op.
    pub fn check_transition(self, next: JobStatus) -> Result<()> {
        if self.is_terminal() {
            return Err(CoreError::TerminalState(self));
        }
        if next == JobStatus::Created && self != JobStatus::Created {
            return Err(CoreError::InvalidTransition {
                from: self,
                to: next,
            });
        }
        Ok(())
    }

    pub fn can_transition_to(self, next: JobStatus) -> bool {
        self.check_transition(next).is_ok()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Created => "Created",
            JobStatus::Running => "Running",
            JobStatus::Paused => "Paused",
            JobStatus::Done => "Done",
            JobStatus::Failed => "Failed",
            JobStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = CoreError;

    /// Parses a status name case-insensitively; anything unrecognized is rejected
    fn from_str(s: &str) -> Result<Self> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for JobStatus {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl Job {
    /// Returns an initialized but empty job
    ///
    /// No identifier is assigned and the status is unset. Intended for
    /// callers that populate a job by hand, such as deserialization targets.
    pub fn create_empty() -> Self {
        Self::default()
    }

    /// Creates a new job with a random UUID identifier
    ///
    /// # Panics
    /// Panics if the system random source is unavailable; a job cannot exist
    /// without a unique identity.
    pub fn new(
        tool_id: impl Into<String>,
        name: impl Into<String>,
        owner: impl Into<String>,
        parameters: HashMap<String, String>,
    ) -> Self {
        let id = JobId::from(uuid::Uuid::new_v4());
        Self::with_id(id, tool_id, name, owner, parameters)
    }

    /// Creates a new job, drawing its identifier from `generator`
    ///
    /// A generator failure is returned as-is and no job is built.
    pub fn create_with(
        generator: &dyn IdGenerator,
        tool_id: impl Into<String>,
        name: impl Into<String>,
        owner: impl Into<String>,
        parameters: HashMap<String, String>,
    ) -> Result<Self> {
        let id = generator.generate()?;
        if id.is_empty() {
            return Err(CoreError::IdGeneration(
                "generator returned an empty identifier".to_string(),
            ));
        }
        Ok(Self::with_id(id, tool_id, name, owner, parameters))
    }

    fn with_id(
        id: JobId,
        tool_id: impl Into<String>,
        name: impl Into<String>,
        owner: impl Into<String>,
        parameters: HashMap<String, String>,
    ) -> Self {
        Self {
            id,
            tool_id: tool_id.into(),
            name: name.into(),
            status: Some(JobStatus::Created),
            owner: owner.into(),
            parameters,
            performance_series: BTreeMap::new(),
            ..Self::default()
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// Current status; `None` only for jobs built with [`Job::create_empty`]
    pub fn status(&self) -> Option<JobStatus> {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_some_and(JobStatus::is_terminal)
    }

    pub fn is_assigned(&self) -> bool {
        !self.assigned_resource.is_empty()
    }

    /// Moves the job to `next`, enforcing the lifecycle rules
    ///
    /// An unset status may be set to anything.
    pub fn transition_to(&mut self, next: JobStatus) -> Result<()> {
        if let Some(current) = self.status {
            current.check_transition(next)?;
        }
        self.status = Some(next);
        Ok(())
    }

    /// Reported completion ratio in `[0.0, 1.0]`
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Sets the reported completion ratio
    ///
    /// Independent of the unit counters; the tool may report a percentage
    /// without knowing its units.
    pub fn set_progress(&mut self, progress: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&progress) {
            return Err(CoreError::ProgressOutOfRange(progress));
        }
        self.progress = progress;
        Ok(())
    }

    /// `units_completed / units_total`, or `None` when the total is unknown
    pub fn units_fraction(&self) -> Option<f64> {
        if self.units_total == 0 {
            return None;
        }
        Some((self.units_completed as f64 / self.units_total as f64).min(1.0))
    }

    pub fn performance_series(&self) -> &BTreeMap<String, String> {
        &self.performance_series
    }

    /// Appends a performance sample; existing samples are never overwritten
    pub fn record_performance(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        let key = key.into();
        if self.performance_series.contains_key(&key) {
            return Err(CoreError::DuplicatePerformanceSample(key));
        }
        self.performance_series.insert(key, value.into());
        Ok(())
    }

    pub fn output_rows(&self) -> &[Vec<String>] {
        &self.output_rows
    }

    pub fn output_titles(&self) -> &[String] {
        &self.output_titles
    }

    /// Sets the column headers; existing rows must already match them
    pub fn set_output_titles(&mut self, titles: Vec<String>) -> Result<()> {
        if let Some(row) = self.output_rows.iter().find(|row| row.len() != titles.len()) {
            return Err(CoreError::OutputShape {
                expected: row.len(),
                actual: titles.len(),
            });
        }
        self.output_titles = titles;
        Ok(())
    }

    /// Appends a result row with one cell per column title
    pub fn push_output_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.output_titles.len() {
            return Err(CoreError::OutputShape {
                expected: self.output_titles.len(),
                actual: row.len(),
            });
        }
        self.output_rows.push(row);
        Ok(())
    }

    /// Replaces the whole result table
    pub fn set_output(&mut self, titles: Vec<String>, rows: Vec<Vec<String>>) -> Result<()> {
        check_output_shape(&titles, &rows)?;
        self.output_titles = titles;
        self.output_rows = rows;
        Ok(())
    }

    /// Re-checks the invariants of a record that did not go through the
    /// validating mutators (e.g. one read back from storage)
    pub fn validate(&self) -> Result<()> {
        if self.status.is_some() && self.id.is_empty() {
            return Err(CoreError::MissingId);
        }
        if !(0.0..=1.0).contains(&self.progress) {
            return Err(CoreError::ProgressOutOfRange(self.progress));
        }
        check_output_shape(&self.output_titles, &self.output_rows)
    }
}

fn check_output_shape(titles: &[String], rows: &[Vec<String>]) -> Result<()> {
    match rows.iter().find(|row| row.len() != titles.len()) {
        Some(row) => Err(CoreError::OutputShape {
            expected: titles.len(),
            actual: row.len(),
        }),
        None => Ok(()),
    }
}
