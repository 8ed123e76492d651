//! Run lifecycle models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Status of a pipeline run
///
/// There is no terminal failure state for the run as a whole: individual
/// steps carry failure outcomes in the logs, while the run itself either
/// finalizes or aborts before any step executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run has not started
    NotStarted,
    /// Steps loaded, watermark being resolved
    Initializing,
    /// Executing the step with this ordinal
    Running(u32),
    /// All configured steps were attempted
    Finalized,
}

/// Observability record for one pipeline run
///
/// Not part of pipeline correctness; persisted to the run history table
/// after finalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Unique run ID
    pub run_id: Uuid,

    /// Current run status
    pub status: RunStatus,

    /// Watermark this run was scoped to
    pub watermark: i64,

    /// Total number of configured steps
    pub total_steps: usize,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finalized
    pub completed_at: Option<DateTime<Utc>>,

    /// Start timestamp of each step, by ordinal
    pub step_starts: Vec<(u32, DateTime<Utc>)>,
}

impl RunRecord {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: RunStatus::NotStarted,
            watermark: 0,
            total_steps: 0,
            started_at: Utc::now(),
            completed_at: None,
            step_starts: Vec::new(),
        }
    }

    /// Mark the run as initializing with the given step count
    pub fn initialize(&mut self, total_steps: usize) {
        self.status = RunStatus::Initializing;
        self.total_steps = total_steps;
        self.started_at = Utc::now();
    }

    /// Record and log a step-start lifecycle event
    pub fn step_started(&mut self, ordinal: u32) {
        let now = Utc::now();
        self.status = RunStatus::Running(ordinal);
        self.step_starts.push((ordinal, now));
        info!(
            run_id = %self.run_id,
            step = ordinal,
            total = self.total_steps,
            started_at = %now.format("%Y-%m-%d %H:%M:%S"),
            "step started"
        );
    }

    /// Record and log the run-finalized lifecycle event
    pub fn finalize(&mut self) {
        let now = Utc::now();
        self.status = RunStatus::Finalized;
        self.completed_at = Some(now);
        let elapsed = now.signed_duration_since(self.started_at);
        info!(
            run_id = %self.run_id,
            total = self.total_steps,
            started_at = %self.started_at.format("%Y-%m-%d %H:%M:%S"),
            completed_at = %now.format("%Y-%m-%d %H:%M:%S"),
            elapsed_ms = elapsed.num_milliseconds(),
            "run finalized"
        );
    }

    /// Whether the run attempted every configured step
    pub fn is_finalized(&self) -> bool {
        self.status == RunStatus::Finalized
    }
}

impl Default for RunRecord {
    fn default() -> Self {
        Self::new()
    }
}
