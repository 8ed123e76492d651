//! Command-line interface

pub mod commands;

use clap::{Parser, Subcommand};
use commands::{RunCommand, ValidateCommand};

/// Sequential pipeline runner for consultation processing
#[derive(Debug, Parser, Clone)]
#[command(name = "opengov-pipeline")]
#[command(version = "0.1.0")]
#[command(about = "Sequential pipeline runner for open-government consultation processing", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write the log stream to this file instead of stderr
    #[arg(short, long, global = true)]
    pub log_file: Option<String>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the configured schedule
    Run(RunCommand),

    /// Validate a schedule configuration
    Validate(ValidateCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

use std::ffi::OsString;
