//! Index-refresh step - trigger reimports on the search index

use crate::core::{ConfigError, RecordSet, RunContext, StepConfig};
use crate::steps::registry::parse_params;
use crate::steps::{fetch_status, Services, Step, StepError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info};

/// Parameters for the index-refresh step
#[derive(Debug, Clone, Deserialize)]
pub struct IndexRefreshParams {
    /// Refresh endpoints, called in declared order
    pub urls: Vec<String>,
}

/// Calls each configured refresh endpoint in order and logs the response
/// code. A failed call is recorded with the service-unavailable sentinel
/// and the remaining endpoints are still tried. Produces no result.
pub struct IndexRefreshStep {
    params: IndexRefreshParams,
    http: reqwest::Client,
}

impl IndexRefreshStep {
    pub fn from_config(config: &StepConfig, services: &Services) -> Result<Self, ConfigError> {
        let params: IndexRefreshParams = parse_params(config)?;
        Ok(Self {
            params,
            http: services.http.clone(),
        })
    }

    #[cfg(test)]
    pub fn with_urls(urls: Vec<String>) -> Self {
        Self {
            params: IndexRefreshParams { urls },
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Step for IndexRefreshStep {
    fn kind(&self) -> &str {
        "index-refresh"
    }

    async fn execute(
        &self,
        _ctx: &RunContext,
        _incoming: Option<&RecordSet>,
    ) -> Result<Option<RecordSet>, StepError> {
        for url in &self.params.urls {
            info!(url, "triggering index import");
            let status = fetch_status(&self.http, url).await;
            if (200..300).contains(&status) {
                info!(url, status, "index import completed");
            } else {
                error!(url, status, "index import returned non-success status");
            }
        }

        Ok(None)
    }
}
