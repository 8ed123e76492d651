//! Annotate step - launch the external annotator

use crate::core::{ConfigError, RecordSet, RunContext, StepConfig};
use crate::steps::registry::parse_params;
use crate::steps::{Services, Step, StepError};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::info;

/// Parameters for the annotate step
#[derive(Debug, Clone, Deserialize)]
pub struct AnnotateParams {
    /// Annotator executable
    pub executable: String,

    /// Directory to run in; the parent's working directory is untouched
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    /// Extra arguments passed through unchanged
    #[serde(default)]
    pub args: Vec<String>,
}

/// Launches the annotator synchronously and waits for it to exit.
/// Produces no result.
pub struct AnnotateStep {
    params: AnnotateParams,
}

impl AnnotateStep {
    pub fn from_config(config: &StepConfig, _services: &Services) -> Result<Self, ConfigError> {
        let params: AnnotateParams = parse_params(config)?;
        Ok(Self { params })
    }

    #[cfg(test)]
    pub fn with_params(params: AnnotateParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl Step for AnnotateStep {
    fn kind(&self) -> &str {
        "annotate"
    }

    async fn execute(
        &self,
        _ctx: &RunContext,
        _incoming: Option<&RecordSet>,
    ) -> Result<Option<RecordSet>, StepError> {
        let mut command = Command::new(&self.params.executable);
        if let Some(work_dir) = &self.params.work_dir {
            command.current_dir(work_dir);
        }
        command.args(&self.params.args);

        info!(
            executable = %self.params.executable,
            args = ?self.params.args,
            "launching annotator"
        );

        let status = command
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| StepError::Spawn {
                program: self.params.executable.clone(),
                source,
            })?;

        if !status.success() {
            return Err(StepError::NonZeroExit {
                program: self.params.executable.clone(),
                code: status.code().unwrap_or(-1),
            });
        }

        info!(executable = %self.params.executable, "annotator finished");
        Ok(None)
    }
}
