//! Hashq CLI
//!
//! Command-line tool for creating and inspecting job records stored as JSON.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hashq")]
#[command(about = "Hashq job record tool", long_about = None)]
struct Cli {
    /// Extra parameter keys to hide from output (comma separated)
    #[arg(
        long = "sensitive-param",
        env = "HASHQ_SENSITIVE_PARAMS",
        value_delimiter = ',',
        global = true
    )]
    sensitive_params: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hashq_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        extra_sensitive_params: cli.sensitive_params,
    };

    handle_command(cli.command, &config)
}
