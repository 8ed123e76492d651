//! Pipeline steps - the polymorphic units of work

pub mod annotate;
pub mod crawl;
pub mod index;
pub mod registry;
pub mod wordcloud;

pub use annotate::AnnotateStep;
pub use crawl::CrawlStep;
pub use index::IndexRefreshStep;
pub use registry::{StepFactory, StepRegistry};
pub use wordcloud::WordCloudStep;

use crate::core::{RecordSet, RunContext};
use crate::store::{StateStore, StoreError};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Shared collaborators handed to every step at construction
///
/// Read-mostly; steps never mutate engine-level run state through them.
#[derive(Clone)]
pub struct Services {
    /// The persistent store with the crawled corpus
    pub store: Arc<dyn StateStore>,

    /// HTTP client shared across remote-calling steps
    pub http: reqwest::Client,
}

impl Services {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            http: reqwest::Client::new(),
        }
    }
}

/// Unrecoverable conditions inside a step
///
/// The engine catches these, logs them, and continues with the next step;
/// they never abort the run. Recoverable conditions (a failed remote call
/// inside a per-item loop) are handled inside the step itself and do not
/// surface here.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with status {code}")]
    NonZeroExit { program: String, code: i32 },

    #[error("failed to resolve classpath from '{dir}': {source}")]
    Classpath {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A single unit of pipeline work
///
/// Executed exactly once per run, in declared order. `Ok(None)` means
/// "nothing to hand downstream", not an error.
#[async_trait]
pub trait Step: Send + Sync {
    /// Registered kind of this step, used as its ResultStore key
    fn kind(&self) -> &str;

    /// Execute the step with the designated predecessor's result, if any
    async fn execute(
        &self,
        ctx: &RunContext,
        incoming: Option<&RecordSet>,
    ) -> Result<Option<RecordSet>, StepError>;
}

impl std::fmt::Debug for dyn Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step").field("kind", &self.kind()).finish()
    }
}

/// Sentinel status recorded when a remote call cannot be made at all
pub(crate) const SERVICE_UNAVAILABLE: u16 = 503;

/// GET a URL and return the response status, substituting the sentinel
/// status when the call itself fails
pub(crate) async fn fetch_status(client: &reqwest::Client, url: &str) -> u16 {
    match client.get(url).send().await {
        Ok(response) => response.status().as_u16(),
        Err(e) => {
            warn!(url, error = %e, "remote call failed, recording service-unavailable");
            SERVICE_UNAVAILABLE
        }
    }
}
