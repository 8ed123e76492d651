//! Test utility steps and runners shared by the scenario tests

use async_trait::async_trait;
use opengov_pipeline::core::{RecordSet, RunContext, RunRecord, ScheduleConfig};
use opengov_pipeline::engine::PipelineEngine;
use opengov_pipeline::steps::{Services, Step, StepError, StepRegistry};
use opengov_pipeline::store::StateStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Step that returns a fixed result
pub struct ProducerStep {
    kind: String,
    result: Option<RecordSet>,
}

impl ProducerStep {
    pub fn new(kind: &str, result: Option<RecordSet>) -> Self {
        Self {
            kind: kind.to_string(),
            result,
        }
    }
}

#[async_trait]
impl Step for ProducerStep {
    fn kind(&self) -> &str {
        &self.kind
    }

    async fn execute(
        &self,
        _ctx: &RunContext,
        _incoming: Option<&RecordSet>,
    ) -> Result<Option<RecordSet>, StepError> {
        Ok(self.result.clone())
    }
}

/// Step that records the incoming result it was handed
pub struct RecordingStep {
    kind: String,
    seen: Arc<Mutex<Vec<Option<RecordSet>>>>,
}

impl RecordingStep {
    pub fn new(kind: &str, seen: Arc<Mutex<Vec<Option<RecordSet>>>>) -> Self {
        Self {
            kind: kind.to_string(),
            seen,
        }
    }
}

#[async_trait]
impl Step for RecordingStep {
    fn kind(&self) -> &str {
        &self.kind
    }

    async fn execute(
        &self,
        _ctx: &RunContext,
        incoming: Option<&RecordSet>,
    ) -> Result<Option<RecordSet>, StepError> {
        self.seen.lock().unwrap().push(incoming.cloned());
        Ok(None)
    }
}

/// Step that always fails
pub struct FailingStep {
    kind: String,
}

impl FailingStep {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
        }
    }
}

#[async_trait]
impl Step for FailingStep {
    fn kind(&self) -> &str {
        &self.kind
    }

    async fn execute(
        &self,
        _ctx: &RunContext,
        _incoming: Option<&RecordSet>,
    ) -> Result<Option<RecordSet>, StepError> {
        Err(StepError::NonZeroExit {
            program: self.kind.clone(),
            code: 1,
        })
    }
}

/// Step that counts how many times it executed
pub struct CountingStep {
    kind: String,
    executions: Arc<AtomicUsize>,
}

impl CountingStep {
    pub fn new(kind: &str, executions: Arc<AtomicUsize>) -> Self {
        Self {
            kind: kind.to_string(),
            executions,
        }
    }
}

#[async_trait]
impl Step for CountingStep {
    fn kind(&self) -> &str {
        &self.kind
    }

    async fn execute(
        &self,
        _ctx: &RunContext,
        _incoming: Option<&RecordSet>,
    ) -> Result<Option<RecordSet>, StepError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

/// Step that queries the store for everything changed since the watermark,
/// the way the crawl step scopes its work
pub struct StoreScanStep {
    kind: String,
    store: Arc<dyn StateStore>,
}

impl StoreScanStep {
    pub fn new(kind: &str, store: Arc<dyn StateStore>) -> Self {
        Self {
            kind: kind.to_string(),
            store,
        }
    }
}

#[async_trait]
impl Step for StoreScanStep {
    fn kind(&self) -> &str {
        &self.kind
    }

    async fn execute(
        &self,
        ctx: &RunContext,
        _incoming: Option<&RecordSet>,
    ) -> Result<Option<RecordSet>, StepError> {
        let changed = self.store.consultations_changed_since(ctx.watermark).await?;
        Ok(Some(changed))
    }
}

/// Parse and run a schedule against a registry and store
pub async fn run_schedule(
    yaml: &str,
    registry: StepRegistry,
    store: Arc<dyn StateStore>,
    first_run: bool,
) -> RunRecord {
    let config = ScheduleConfig::from_yaml(yaml).expect("schedule should be valid");
    let engine = PipelineEngine::new(registry, Services::new(store));
    engine
        .run(&config, first_run)
        .await
        .expect("run should not abort")
}

/// Assert the run attempted every step and finalized
pub fn assert_run_finalized(record: &RunRecord, expected_steps: usize) {
    assert!(record.is_finalized(), "run should reach Finalized");
    assert_eq!(record.total_steps, expected_steps);
    assert_eq!(record.step_starts.len(), expected_steps);
}
