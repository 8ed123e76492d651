//! Core domain models
//!
//! This module defines the fundamental data structures that represent
//! schedules, run state, and the results relayed between steps.

pub mod config;
pub mod context;
pub mod state;

pub use config::{ConfigError, ScheduleConfig, StepConfig};
pub use context::{RecordSet, ResultStore, RunContext};
pub use state::{RunRecord, RunStatus};
