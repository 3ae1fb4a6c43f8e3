//! Deterministic demo explanations

use async_trait::async_trait;

use super::{ExplainResult, ExplanationProvider};
use crate::models::{Anomaly, ExplanationSource, ProviderStatus};
use crate::utils::format_pct;

/// Templated explanations used when no live model is available
#[derive(Debug, Clone)]
pub struct DemoProvider {
    reason: String,
}

impl Default for DemoProvider {
    fn default() -> Self {
        Self::with_reason("demo mode")
    }
}

impl DemoProvider {
    /// Demo provider that reports why live explanations are off
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The demo sentence for an anomaly of `keyword`
    pub fn template(anomaly: &Anomaly, keyword: &str) -> String {
        format!(
            "(Demo) Possible reason interest in '{keyword}' {} {}: seasonal events, news cycles, or viral content around {}.",
            anomaly.direction.verb(),
            format_pct(anomaly.percent_change),
            anomaly.week_start.format("%Y-%m-%d"),
        )
    }
}

#[async_trait]
impl ExplanationProvider for DemoProvider {
    fn source(&self) -> ExplanationSource {
        ExplanationSource::Demo
    }

    fn status(&self) -> ProviderStatus {
        ProviderStatus::Demo {
            reason: self.reason.clone(),
        }
    }

    async fn explain(&self, anomaly: &Anomaly, keyword: &str) -> ExplainResult<String> {
        Ok(Self::template(anomaly, keyword))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use chrono::NaiveDate;

    #[test]
    fn test_template_is_deterministic() {
        let anomaly = Anomaly {
            week_start: NaiveDate::from_ymd_opt(2023, 7, 2).unwrap(),
            previous_value: 90,
            current_value: 60,
            percent_change: -1.0 / 3.0,
            direction: Direction::Drop,
        };

        let text = DemoProvider::template(&anomaly, "electric cars");
        assert_eq!(
            text,
            "(Demo) Possible reason interest in 'electric cars' dropped -33.3%: seasonal events, news cycles, or viral content around 2023-07-02."
        );
        assert_eq!(text, DemoProvider::template(&anomaly, "electric cars"));
    }

    #[tokio::test]
    async fn test_explain_mentions_keyword_direction_and_change() {
        let anomaly = Anomaly {
            week_start: NaiveDate::from_ymd_opt(2023, 3, 5).unwrap(),
            previous_value: 100,
            current_value: 135,
            percent_change: 0.35,
            direction: Direction::Spike,
        };

        let text = DemoProvider::default()
            .explain(&anomaly, "electric cars")
            .await
            .unwrap();
        assert!(text.contains("'electric cars'"));
        assert!(text.contains("spiked"));
        assert!(text.contains("+35.0%"));
    }

    #[test]
    fn test_status_carries_reason() {
        let provider = DemoProvider::with_reason("no API key configured");
        assert_eq!(
            provider.status(),
            ProviderStatus::Demo {
                reason: "no API key configured".to_string()
            }
        );
    }
}
