//! Explanation providers for detected anomalies
//!
//! Two providers implement [`ExplanationProvider`]:
//!
//! - [`LiveProvider`] asks a hosted language model for a short hypothesis
//! - [`DemoProvider`] returns a deterministic templated sentence and never fails
//!
//! [`select_provider`] picks one once, at pipeline construction, based on
//! whether a credential resolved. [`explain_with_fallback`] isolates a live
//! failure to the anomaly that caused it.

pub mod demo;
pub mod live;

use async_trait::async_trait;
use std::sync::Arc;

use crate::llm::{Credential, LlmConfig};
use crate::models::{Anomaly, Explanation, ExplanationSource, ProviderStatus};
use crate::utils::error::ExplainError;

pub use demo::DemoProvider;
pub use live::{build_prompt, LiveProvider};

/// Result type for explanation calls
pub type ExplainResult<T> = Result<T, ExplainError>;

/// Capability to explain an anomaly in natural language
#[async_trait]
pub trait ExplanationProvider: Send + Sync {
    /// Source tag attached to successful explanations
    fn source(&self) -> ExplanationSource;

    /// Status shown to the caller for this provider
    fn status(&self) -> ProviderStatus;

    /// Generate explanation text for one anomaly of `keyword`
    async fn explain(&self, anomaly: &Anomaly, keyword: &str) -> ExplainResult<String>;
}

/// Choose the live provider when a credential is available, otherwise demo
pub fn select_provider(
    config: &LlmConfig,
    credential: Option<Credential>,
    region: &str,
) -> Arc<dyn ExplanationProvider> {
    let Some(credential) = credential else {
        tracing::info!("No API key configured, using demo explanations");
        return Arc::new(DemoProvider::with_reason("no API key configured"));
    };

    match LiveProvider::new(config.clone(), credential, region) {
        Ok(provider) => {
            tracing::info!(model = %config.model, "Using live explanations");
            Arc::new(provider)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Live provider unavailable, using demo explanations");
            Arc::new(DemoProvider::with_reason(e.to_string()))
        }
    }
}

/// Explain one anomaly, degrading to demo text tagged `error` on failure
pub async fn explain_with_fallback(
    provider: &dyn ExplanationProvider,
    anomaly: &Anomaly,
    keyword: &str,
) -> Explanation {
    let identity = anomaly.identity(keyword);

    match provider.explain(anomaly, keyword).await {
        Ok(text) => Explanation::new(identity, text, provider.source()),
        Err(e) => {
            tracing::warn!(
                anomaly = %identity,
                error = %e,
                "Explanation failed, falling back to demo text"
            );
            let text = DemoProvider::template(anomaly, keyword);
            Explanation::failed(identity, text, e.to_string())
        }
    }
}
