//! Word-cloud step - run the extractor over each changed consultation

use crate::core::{ConfigError, RecordSet, RunContext, StepConfig};
use crate::steps::registry::parse_params;
use crate::steps::{fetch_status, Services, Step, StepError};
use crate::store::StateStore;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

/// Parameters for the word-cloud step
#[derive(Debug, Clone, Deserialize)]
pub struct WordCloudParams {
    /// Extractor endpoint; the consultation id is appended as a query
    /// parameter
    pub url: String,
}

/// Calls the word-cloud extractor once per consultation in the work set.
///
/// The work set is the incoming result of the designated predecessor
/// (normally the crawl step); when no result was handed down, the full
/// unfiltered set is fetched from the store, since the extractor must have
/// some work set. Per-consultation response codes are collected and every
/// non-success is logged. Produces no result.
pub struct WordCloudStep {
    params: WordCloudParams,
    store: Arc<dyn StateStore>,
    http: reqwest::Client,
}

impl WordCloudStep {
    pub fn from_config(config: &StepConfig, services: &Services) -> Result<Self, ConfigError> {
        let params: WordCloudParams = parse_params(config)?;
        Ok(Self {
            params,
            store: services.store.clone(),
            http: services.http.clone(),
        })
    }

    #[cfg(test)]
    pub fn new(url: String, store: Arc<dyn StateStore>) -> Self {
        Self {
            params: WordCloudParams { url },
            store,
            http: reqwest::Client::new(),
        }
    }

    /// The incoming set when present, otherwise everything the store knows
    async fn resolve_work_set(
        &self,
        incoming: Option<&RecordSet>,
    ) -> Result<RecordSet, StepError> {
        match incoming {
            Some(set) => Ok(set.clone()),
            None => {
                let all = self.store.consultations_changed_since(0).await?;
                info!(
                    total = all.len(),
                    "no consultations handed down, extracting over the full set"
                );
                Ok(all)
            }
        }
    }

    async fn call_extractor(&self, consultation_id: i64) -> u16 {
        let url = format!("{}?consultation_id={}", self.params.url, consultation_id);
        info!(consultation_id, "calling word cloud extractor");
        fetch_status(&self.http, &url).await
    }

    /// Split collected response codes into failures worth logging
    fn failed_calls(statuses: &[(i64, u16)]) -> Vec<(i64, u16)> {
        statuses
            .iter()
            .filter(|(_, status)| !(200..300).contains(status))
            .copied()
            .collect()
    }
}

#[async_trait]
impl Step for WordCloudStep {
    fn kind(&self) -> &str {
        "word-cloud"
    }

    async fn execute(
        &self,
        _ctx: &RunContext,
        incoming: Option<&RecordSet>,
    ) -> Result<Option<RecordSet>, StepError> {
        let work_set = self.resolve_work_set(incoming).await?;
        if work_set.is_empty() {
            info!("no consultations to extract, nothing to do");
            return Ok(None);
        }

        let mut statuses = Vec::with_capacity(work_set.len());
        for consultation_id in &work_set {
            let status = self.call_extractor(*consultation_id).await;
            statuses.push((*consultation_id, status));
        }

        for (consultation_id, status) in Self::failed_calls(&statuses) {
            error!(
                consultation_id,
                status, "word cloud extraction returned non-success status"
            );
        }

        Ok(None)
    }
}
