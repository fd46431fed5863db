//! Job command handlers
//!
//! Creates job records and displays existing ones. Parameters are always
//! shown through the sanitizer; the full record only ever goes to a file.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use hashq_core::domain::job::{Job, JobStatus};
use hashq_core::domain::sanitize::ParameterSanitizer;
use hashq_core::dto::job::JobLogView;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::Config;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Create a new job record
    New {
        /// Tool the job runs on
        #[arg(long)]
        tool: String,

        /// Job name
        #[arg(long, default_value = "")]
        name: String,

        /// Submitting principal
        #[arg(long)]
        owner: String,

        /// Tool parameter as key=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,

        /// Team granted visibility (repeatable)
        #[arg(long = "team")]
        teams: Vec<String>,

        /// Write the full record to this file; stdout only shows the log-safe view
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show a job record
    Show {
        /// Path to a job JSON file
        file: PathBuf,
    },
    /// Print the log-safe parameters of a job record as JSON
    Sanitize {
        /// Path to a job JSON file
        file: PathBuf,
    },
}

/// Handle job commands
pub fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let sanitizer = config.sanitizer();
    let mut out = std::io::stdout().lock();

    match command {
        JobCommands::New {
            tool,
            name,
            owner,
            params,
            teams,
            output,
        } => {
            let parameters: HashMap<String, String> = params.into_iter().collect();
            let mut job = Job::new(tool, name, owner, parameters);
            job.visible_to_teams = teams;
            new_job(&mut out, &job, output.as_deref(), &sanitizer)
        }
        JobCommands::Show { file } => show_job(&mut out, &file, &sanitizer),
        JobCommands::Sanitize { file } => sanitize_job(&mut out, &file, &sanitizer),
    }
}

/// Save a new job record and report it
///
/// Only the `--output` file holds the full record; `out` gets the log view.
fn new_job(
    out: &mut impl Write,
    job: &Job,
    output: Option<&Path>,
    sanitizer: &ParameterSanitizer,
) -> Result<()> {
    match output {
        Some(path) => {
            let json = serde_json::to_string_pretty(job).context("Failed to serialize job")?;
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(job_id = %job.id(), path = %path.display(), "Job record written");
            writeln!(out, "{} Created job {}", "✓".green(), job.id().to_string().cyan())?;
            writeln!(out, "  Saved to {}", path.display().to_string().dimmed())?;
        }
        None => {
            let view = JobLogView::new(job, sanitizer);
            let json = serde_json::to_string_pretty(&view).context("Failed to serialize job")?;
            info!(job_id = %job.id(), "Job created; pass --output to keep the full record");
            writeln!(out, "{}", json)?;
        }
    }

    Ok(())
}

/// Display a job record
fn show_job(out: &mut impl Write, path: &Path, sanitizer: &ParameterSanitizer) -> Result<()> {
    let job = load_job(path)?;
    if let Err(e) = job.validate() {
        writeln!(out, "{} {}", "⚠ Invalid record:".yellow(), e)?;
    }
    write_job_details(out, &job, sanitizer)?;
    Ok(())
}

/// Print sanitized parameters as JSON
fn sanitize_job(out: &mut impl Write, path: &Path, sanitizer: &ParameterSanitizer) -> Result<()> {
    let job = load_job(path)?;
    let clean = sanitizer.sanitize(&job);
    let json = serde_json::to_string_pretty(&clean).context("Failed to serialize parameters")?;
    writeln!(out, "{}", json)?;
    Ok(())
}

fn load_job(path: &Path) -> Result<Job> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let job: Job = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse job record {}", path.display()))?;
    debug!(job_id = %job.id(), path = %path.display(), "Loaded job record");
    Ok(job)
}

/// Write detailed job information
fn write_job_details(
    out: &mut impl Write,
    job: &Job,
    sanitizer: &ParameterSanitizer,
) -> std::io::Result<()> {
    writeln!(out, "{}", "Job Details:".bold())?;
    writeln!(out, "  ID:        {}", job.id().to_string().cyan())?;
    writeln!(out, "  Name:      {}", job.name)?;
    writeln!(out, "  Tool:      {}", job.tool_id.dimmed())?;
    writeln!(out, "  Owner:     {}", job.owner)?;
    writeln!(out, "  Status:    {}", colorize_status(job.status()))?;

    if !job.visible_to_teams.is_empty() {
        writeln!(out, "  Teams:     {}", job.visible_to_teams.join(", "))?;
    }
    if job.is_assigned() {
        writeln!(out, "  Resource:  {}", job.assigned_resource)?;
    }
    if let Some(started) = job.started_at {
        writeln!(out, "  Started:   {}", started.format("%Y-%m-%d %H:%M:%S"))?;
    }
    if let Some(running) = job.running_since {
        writeln!(out, "  Running:   {}", running.format("%Y-%m-%d %H:%M:%S"))?;
    }
    if let Some(purge) = job.purge_at {
        writeln!(out, "  Purge at:  {}", purge.format("%Y-%m-%d %H:%M:%S"))?;
    }

    writeln!(out, "  Progress:  {}", format_progress(job))?;
    if !job.estimated_completion.is_empty() {
        writeln!(out, "  ETC:       {}", job.estimated_completion)?;
    }

    let clean = sanitizer.sanitize(job);
    if !job.parameters.is_empty() {
        writeln!(out, "\n{}", "Parameters:".bold())?;
        let mut keys: Vec<_> = clean.keys().collect();
        keys.sort();
        for key in keys {
            writeln!(out, "  {} = {}", key.cyan(), clean[key])?;
        }
        let hidden = job.parameters.len() - clean.len();
        if hidden > 0 {
            let note = format!("({} sensitive parameter(s) hidden)", hidden);
            writeln!(out, "  {}", note.dimmed())?;
        }
    }

    if !job.performance_series().is_empty() {
        let label = if job.performance_label.is_empty() {
            "Performance"
        } else {
            job.performance_label.as_str()
        };
        writeln!(out, "\n{}", format!("{}:", label).bold())?;
        for (at, sample) in job.performance_series() {
            writeln!(out, "  {} {}", at.dimmed(), sample)?;
        }
    }

    if !job.output_rows().is_empty() {
        writeln!(out, "\n{}", "Output:".bold())?;
        writeln!(out, "  {}", job.output_titles().join(" | ").bold())?;
        for row in job.output_rows() {
            writeln!(out, "  {}", row.join(" | "))?;
        }
    }

    if !job.last_error.is_empty() {
        writeln!(out, "\n{}", "Error:".bold())?;
        writeln!(out, "{}", job.last_error.red())?;
    }

    Ok(())
}

fn format_progress(job: &Job) -> String {
    let mut text = format!("{:.1}%", job.progress() * 100.0);
    if job.units_total > 0 {
        text.push_str(&format!(" ({}/{})", job.units_completed, job.units_total));
    }
    text
}

/// Colorize job status for display
fn colorize_status(status: Option<JobStatus>) -> ColoredString {
    let Some(status) = status else {
        return "unset".dimmed();
    };
    let status_str = status.to_string();
    match status {
        JobStatus::Created => status_str.yellow(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Paused => status_str.blue(),
        JobStatus::Done => status_str.green(),
        JobStatus::Failed => status_str.red(),
        JobStatus::Cancelled => status_str.dimmed(),
    }
}

/// Parses a `key=value` pair; the value may itself contain `=`
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid key=value: no `=` found in `{}`", s))?;
    if key.is_empty() {
        return Err(format!("invalid key=value: empty key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}
