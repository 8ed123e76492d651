//! Test: HTTP-calling steps run end-to-end through the engine

use crate::helpers::*;
use opengov_pipeline::steps::StepRegistry;
use opengov_pipeline::store::{MemoryStateStore, StateStore};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Full schedule: a scan step collects the changed set, the index is
/// refreshed, and the extractor is called once per consultation. One
/// extractor call returns 500; the run still finalizes.
#[tokio::test]
async fn test_refresh_and_extract_schedule() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/solr/comments/dataimport"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/extract"))
        .and(query_param("consultation_id", "101"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/extract"))
        .and(query_param("consultation_id", "102"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStateStore::new());
    store.insert_comment(10, 101).await;
    store.insert_comment(20, 102).await;

    let yaml = format!(
        r#"
name: "Refresh and extract"
steps:
  - ordinal: 1
    kind: "scan"
  - ordinal: 2
    kind: "index-refresh"
    params:
      urls:
        - "{base}/solr/comments/dataimport"
  - ordinal: 3
    kind: "word-cloud"
    consumes: "scan"
    params:
      url: "{base}/extract"
"#,
        base = server.uri()
    );

    let scan_store: Arc<dyn StateStore> = store.clone();
    let mut registry = StepRegistry::with_builtin_steps();
    registry.register("scan", move |_, _| {
        Ok(Box::new(StoreScanStep::new("scan", scan_store.clone())))
    });

    let record = run_schedule(&yaml, registry, store, true).await;
    assert_run_finalized(&record, 3);
}

/// With no predecessor result, word-cloud falls back to the full set.
#[tokio::test]
async fn test_word_cloud_fallback_through_engine() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/extract"))
        .and(query_param("consultation_id", "101"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStateStore::new());
    store.insert_comment(10, 101).await;

    let yaml = format!(
        r#"
name: "Extract all"
steps:
  - ordinal: 1
    kind: "word-cloud"
    params:
      url: "{}/extract"
"#,
        server.uri()
    );

    let registry = StepRegistry::with_builtin_steps();
    let record = run_schedule(&yaml, registry, store, true).await;
    assert_run_finalized(&record, 1);
}
