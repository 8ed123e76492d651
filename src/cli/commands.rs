//! CLI command definitions

use clap::Args;

/// Run the configured schedule
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to schedule YAML file
    #[arg(short, long)]
    pub schedule: String,

    /// Reset the watermark to the baseline instead of reading it from the
    /// store (use on the very first run)
    #[arg(long)]
    pub first_run: bool,

    /// Path to the SQLite database (defaults to the platform data dir)
    #[arg(long)]
    pub database: Option<String>,
}

/// Validate a schedule configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to schedule YAML file
    #[arg(short, long)]
    pub schedule: String,

    /// Output the parsed schedule in JSON format
    #[arg(long)]
    pub json: bool,
}
