//! Pipeline engine - sequencing, result relay, lifecycle records

use crate::core::{ConfigError, RunContext, RunRecord, ScheduleConfig};
use crate::steps::{Services, StepRegistry};
use crate::store::StoreError;
use thiserror::Error;
use tracing::{error, info, warn};

/// Failures that abort a run before any step executes
///
/// Step-level failures never appear here; they are isolated per step and
/// the run continues.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The watermark is foundational to downstream filtering: defaulting
    /// it silently would reprocess the entire history, so a store failure
    /// here is fatal for the run.
    #[error("failed to resolve watermark: {0}")]
    Watermark(#[source] StoreError),
}

/// Drives one run end to end: loads steps, resolves the watermark, executes
/// each step in ascending ordinal order, and relays results between them.
///
/// Strictly sequential; one step runs to completion (including any blocking
/// subprocess or network call) before the next begins.
pub struct PipelineEngine {
    registry: StepRegistry,
    services: Services,
}

impl PipelineEngine {
    pub fn new(registry: StepRegistry, services: Services) -> Self {
        Self { registry, services }
    }

    /// Watermark for this run: the baseline on a first run, otherwise the
    /// store's latest value
    async fn resolve_watermark(&self, first_run: bool) -> Result<i64, EngineError> {
        if first_run {
            return Ok(0);
        }
        self.services
            .store
            .latest_watermark()
            .await
            .map_err(EngineError::Watermark)
    }

    /// Execute every configured step once, in declared order
    pub async fn run(
        &self,
        config: &ScheduleConfig,
        first_run: bool,
    ) -> Result<RunRecord, EngineError> {
        let mut record = RunRecord::new();

        let steps = self.registry.load_steps(config, &self.services)?;
        record.initialize(steps.len());

        let watermark = self.resolve_watermark(first_run).await?;
        record.watermark = watermark;

        info!(
            run_id = %record.run_id,
            schedule = %config.name,
            steps = steps.len(),
            watermark,
            "initializing schedule"
        );

        let mut ctx = RunContext::new(watermark, steps.len());

        // load_steps preserves declared order, so specs and instances zip
        for (spec, (ordinal, step)) in config.steps.iter().zip(&steps) {
            record.step_started(*ordinal);

            let incoming = spec
                .consumes
                .as_deref()
                .and_then(|kind| ctx.results.get(kind))
                .cloned();
            if spec.consumes.is_some() && incoming.is_none() {
                info!(
                    step = step.kind(),
                    consumes = spec.consumes.as_deref().unwrap_or_default(),
                    "predecessor produced no result, nothing handed down"
                );
            }

            match step.execute(&ctx, incoming.as_ref()).await {
                Ok(Some(result)) if !result.is_empty() => {
                    info!(step = step.kind(), produced = result.len(), "step completed");
                    ctx.results.put(step.kind(), result);
                }
                Ok(_) => {
                    info!(step = step.kind(), "step completed with no result");
                }
                Err(e) => {
                    // failure isolation: log with full context, move on
                    error!(step = step.kind(), error = %e, "step failed, continuing with next step");
                }
            }
        }

        record.finalize();

        // run history is observability only; a write failure is not fatal
        if let Err(e) = self.services.store.record_run(&record).await {
            warn!(error = %e, "failed to record run history");
        }

        Ok(record)
    }
}
