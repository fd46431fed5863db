//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;

pub use job::JobCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Job record management
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
}

/// Handle a CLI command
pub fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Job { command } => job::handle_job_command(command, config),
    }
}
