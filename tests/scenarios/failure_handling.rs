//! Test: per-step failure isolation

use crate::helpers::*;
use opengov_pipeline::core::RecordSet;
use opengov_pipeline::steps::StepRegistry;
use opengov_pipeline::store::MemoryStateStore;
use std::sync::{Arc, Mutex};

/// A failing step is isolated; every remaining step still executes and
/// the run reaches Finalized.
#[tokio::test]
async fn test_failing_step_does_not_stop_the_run() {
    let yaml = r#"
name: "Failure isolation"
steps:
  - ordinal: 1
    kind: "broken"
  - ordinal: 2
    kind: "producer"
  - ordinal: 3
    kind: "consumer"
    consumes: "producer"
"#;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();

    let mut registry = StepRegistry::new();
    registry.register("broken", |_, _| Ok(Box::new(FailingStep::new("broken"))));
    registry.register("producer", |_, _| {
        Ok(Box::new(ProducerStep::new(
            "producer",
            Some(RecordSet::from([7])),
        )))
    });
    registry.register("consumer", move |_, _| {
        Ok(Box::new(RecordingStep::new("consumer", seen_clone.clone())))
    });

    let store = Arc::new(MemoryStateStore::new());
    let record = run_schedule(yaml, registry, store, true).await;

    assert_run_finalized(&record, 3);
    // downstream of the failure still received its own predecessor's result
    assert_eq!(seen.lock().unwrap().as_slice(), &[Some(RecordSet::from([7]))]);
}

/// A failed step leaves nothing in the result store; its consumer is
/// handed no work, which is "nothing to do" rather than an error.
#[tokio::test]
async fn test_failed_step_result_is_absent() {
    let yaml = r#"
name: "Failed producer"
steps:
  - ordinal: 1
    kind: "broken"
  - ordinal: 2
    kind: "consumer"
    consumes: "broken"
"#;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();

    let mut registry = StepRegistry::new();
    registry.register("broken", |_, _| Ok(Box::new(FailingStep::new("broken"))));
    registry.register("consumer", move |_, _| {
        Ok(Box::new(RecordingStep::new("consumer", seen_clone.clone())))
    });

    let store = Arc::new(MemoryStateStore::new());
    let record = run_schedule(yaml, registry, store, true).await;

    assert_run_finalized(&record, 2);
    assert_eq!(seen.lock().unwrap().as_slice(), &[None]);
}

/// Every step failing still finalizes the run.
#[tokio::test]
async fn test_all_steps_failing_still_finalizes() {
    let yaml = r#"
name: "Everything broken"
steps:
  - ordinal: 1
    kind: "broken-a"
  - ordinal: 2
    kind: "broken-b"
"#;

    let mut registry = StepRegistry::new();
    registry.register("broken-a", |_, _| Ok(Box::new(FailingStep::new("broken-a"))));
    registry.register("broken-b", |_, _| Ok(Box::new(FailingStep::new("broken-b"))));

    let store = Arc::new(MemoryStateStore::new());
    let record = run_schedule(yaml, registry, store, true).await;

    assert_run_finalized(&record, 2);
}
