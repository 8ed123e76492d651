//! Crawl step - launch the crawler, then collect what it changed

use crate::core::{ConfigError, RecordSet, RunContext, StepConfig};
use crate::steps::registry::parse_params;
use crate::steps::{Services, Step, StepError};
use crate::store::StateStore;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, error, info};

/// Parameters for the crawl step
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlParams {
    /// Directory the crawler runs in
    pub work_dir: PathBuf,

    /// Crawler jar, relative to `work_dir` unless absolute
    pub executable: String,

    /// Crawler configuration file passed as the first argument
    pub config_file: String,

    /// Directory of dependency jars; when set together with `main_class`
    /// the crawler is launched with a resolved `-cp` instead of `-jar`
    #[serde(default)]
    pub lib_dir: Option<PathBuf>,

    /// Entry point class, required when `lib_dir` is set
    #[serde(default)]
    pub main_class: Option<String>,

    /// Java binary to invoke
    #[serde(default = "default_java")]
    pub java: String,
}

fn default_java() -> String {
    "java".to_string()
}

/// Launches the external crawler synchronously, then queries the store for
/// consultations with comments newer than the run's watermark. The changed
/// set is this step's result, handed downstream by the engine. The query
/// runs even when the crawler exits non-zero, so a partial crawl still
/// hands its incremental set to consumers.
pub struct CrawlStep {
    params: CrawlParams,
    store: Arc<dyn StateStore>,
}

impl CrawlStep {
    pub fn from_config(config: &StepConfig, services: &Services) -> Result<Self, ConfigError> {
        let params: CrawlParams = parse_params(config)?;
        Ok(Self {
            params,
            store: services.store.clone(),
        })
    }

    /// Join the executable with every jar under `lib_dir` into a classpath
    fn resolve_classpath(&self, lib_dir: &Path) -> Result<String, StepError> {
        let entries = std::fs::read_dir(lib_dir).map_err(|source| StepError::Classpath {
            dir: lib_dir.display().to_string(),
            source,
        })?;

        let mut jars: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "jar"))
            .map(|path| path.display().to_string())
            .collect();
        jars.sort();

        let mut parts = vec![self.params.executable.clone()];
        parts.extend(jars);
        Ok(parts.join(":"))
    }

    async fn launch_crawler(&self) -> Result<(), StepError> {
        let mut command = Command::new(&self.params.java);
        // current_dir scopes the working directory to the child process;
        // the parent's directory is untouched regardless of outcome
        command.current_dir(&self.params.work_dir);

        match (&self.params.lib_dir, &self.params.main_class) {
            (Some(lib_dir), Some(main_class)) => {
                let classpath = self.resolve_classpath(lib_dir)?;
                debug!(classpath = %classpath, "resolved crawler classpath");
                command.args(["-cp", &classpath, main_class]);
            }
            _ => {
                command.args(["-jar", &self.params.executable]);
            }
        }
        command.arg(&self.params.config_file);

        info!(
            work_dir = %self.params.work_dir.display(),
            executable = %self.params.executable,
            "launching crawler"
        );

        let status = command
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| StepError::Spawn {
                program: self.params.java.clone(),
                source,
            })?;

        // a non-zero exit is logged, not fatal: whatever the crawler wrote
        // before failing is still collected below
        if !status.success() {
            error!(
                executable = %self.params.executable,
                code = status.code().unwrap_or(-1),
                "crawler exited with non-zero status"
            );
        }

        Ok(())
    }
}

#[async_trait]
impl Step for CrawlStep {
    fn kind(&self) -> &str {
        "crawl"
    }

    async fn execute(
        &self,
        ctx: &RunContext,
        _incoming: Option<&RecordSet>,
    ) -> Result<Option<RecordSet>, StepError> {
        self.launch_crawler().await?;

        let changed = self.store.consultations_changed_since(ctx.watermark).await?;
        info!(
            watermark = ctx.watermark,
            changed = changed.len(),
            "crawler finished, collected changed consultations"
        );

        Ok(Some(changed))
    }
}
