//! Language-model backed explanations

use async_trait::async_trait;

use super::{ExplainResult, ExplanationProvider};
use crate::llm::{Credential, LlmClient, LlmConfig};
use crate::models::{Anomaly, ExplanationSource, ProviderStatus};
use crate::utils::error::ExplainError;
use crate::utils::{format_pct, region_display_name};

/// Build the prompt sent to the model for one anomaly
pub fn build_prompt(keyword: &str, anomaly: &Anomaly, region: &str) -> String {
    format!(
        "Explain why search interest in '{keyword}' might have {} by {} \
         (from {} to {}) in the week of {} in {}. \
         Give a concise 2-3 sentence hypothesis.",
        anomaly.direction.verb(),
        format_pct(anomaly.percent_change),
        anomaly.previous_value,
        anomaly.current_value,
        anomaly.week_start.format("%Y-%m-%d"),
        region_display_name(region),
    )
}

/// Explanations generated by a hosted chat model
pub struct LiveProvider {
    client: LlmClient,
    region: String,
}

impl LiveProvider {
    /// Create a live provider for the given region
    ///
    /// # Arguments
    ///
    /// * `config` - Chat endpoint, model and generation settings
    /// * `credential` - API key sent as a bearer token
    /// * `region` - Region code named in the prompt
    ///
    /// # Errors
    ///
    /// Returns `ExplainError::ProviderUnavailable` if the client cannot be built
    pub fn new(config: LlmConfig, credential: Credential, region: &str) -> ExplainResult<Self> {
        Ok(Self {
            client: LlmClient::with_config(config, credential)?,
            region: region.to_string(),
        })
    }
}

#[async_trait]
impl ExplanationProvider for LiveProvider {
    fn source(&self) -> ExplanationSource {
        ExplanationSource::Live
    }

    fn status(&self) -> ProviderStatus {
        ProviderStatus::Live {
            model: self.client.model().to_string(),
        }
    }

    async fn explain(&self, anomaly: &Anomaly, keyword: &str) -> ExplainResult<String> {
        let prompt = build_prompt(keyword, anomaly, &self.region);
        tracing::debug!(keyword = %keyword, week = %anomaly.week_start, "Requesting explanation");

        self.client.complete(&prompt).await.map_err(|e| match e {
            ExplainError::ProviderUnavailable(msg) => ExplainError::ProviderUnavailable(msg),
            ExplainError::GenerationFailed(msg) => {
                ExplainError::GenerationFailed(format!("{}: {msg}", self.client.model()))
            }
        })
    }
}
