//! Test: watermark resolution at run start

use crate::helpers::*;
use opengov_pipeline::core::ScheduleConfig;
use opengov_pipeline::engine::{EngineError, PipelineEngine};
use opengov_pipeline::steps::{Services, StepRegistry};
use opengov_pipeline::store::{MemoryStateStore, UnavailableStateStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// first_run resets to the baseline regardless of store content.
#[tokio::test]
async fn test_first_run_ignores_store_watermark() {
    let yaml = r#"
name: "First run"
steps:
  - ordinal: 1
    kind: "count"
"#;

    let store = Arc::new(MemoryStateStore::new());
    store.insert_comment(500, 1).await;

    let executions = Arc::new(AtomicUsize::new(0));
    let executions_clone = executions.clone();
    let mut registry = StepRegistry::new();
    registry.register("count", move |_, _| {
        Ok(Box::new(CountingStep::new("count", executions_clone.clone())))
    });

    let record = run_schedule(yaml, registry, store, true).await;
    assert_eq!(record.watermark, 0);
    assert_eq!(executions.load(Ordering::SeqCst), 1);
}

/// A normal run reads the store's latest value.
#[tokio::test]
async fn test_watermark_read_from_store() {
    let yaml = r#"
name: "From store"
steps:
  - ordinal: 1
    kind: "count"
"#;

    let store = Arc::new(MemoryStateStore::new());
    store.insert_comment(500, 1).await;

    let executions = Arc::new(AtomicUsize::new(0));
    let executions_clone = executions.clone();
    let mut registry = StepRegistry::new();
    registry.register("count", move |_, _| {
        Ok(Box::new(CountingStep::new("count", executions_clone.clone())))
    });

    let record = run_schedule(yaml, registry, store, false).await;
    assert_eq!(record.watermark, 500);
}

/// A store failure while resolving the watermark aborts the run before
/// any step executes.
#[tokio::test]
async fn test_store_failure_aborts_before_any_step() {
    let yaml = r#"
name: "Store down"
steps:
  - ordinal: 1
    kind: "count"
  - ordinal: 2
    kind: "count2"
"#;

    let executions = Arc::new(AtomicUsize::new(0));
    let first = executions.clone();
    let second = executions.clone();
    let mut registry = StepRegistry::new();
    registry.register("count", move |_, _| {
        Ok(Box::new(CountingStep::new("count", first.clone())))
    });
    registry.register("count2", move |_, _| {
        Ok(Box::new(CountingStep::new("count2", second.clone())))
    });

    let config = ScheduleConfig::from_yaml(yaml).unwrap();
    let engine = PipelineEngine::new(registry, Services::new(Arc::new(UnavailableStateStore)));

    let err = engine.run(&config, false).await.unwrap_err();
    assert!(matches!(err, EngineError::Watermark(_)));
    assert_eq!(executions.load(Ordering::SeqCst), 0);
}
