//! Analysis pipeline: fetch → detect → explain
//!
//! A [`Pipeline`] owns its trend source, its explanation provider (chosen once
//! at construction) and a shared [`ExplanationCache`]. Fetch failures abort the
//! run; explanation failures are isolated to the anomaly that caused them.

use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::analytics::AnomalyDetector;
use crate::cache::ExplanationCache;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::explain::{explain_with_fallback, select_provider, ExplanationProvider};
use crate::llm::Credential;
use crate::models::{
    AnalysisReport, AnalyzedAnomaly, Anomaly, ProviderStatus, TrendQuery, DEFAULT_REGION,
    DEFAULT_YEAR,
};
use crate::trends::{TrendSource, TrendsFetcher};

/// Analysis pipeline for one interactive session
pub struct Pipeline {
    source: Arc<dyn TrendSource>,
    provider: Arc<dyn ExplanationProvider>,
    cache: Arc<ExplanationCache>,
    detector: AnomalyDetector,
    year: i32,
    region: String,
    explain_concurrency: usize,
}

impl Pipeline {
    /// Build the production pipeline from configuration
    ///
    /// The live provider is selected when `credential` is present.
    pub fn from_config(config: &Config, credential: Option<Credential>) -> Result<Self> {
        let source = Arc::new(TrendsFetcher::new(&config.trends)?);
        let provider = select_provider(&config.llm, credential, &config.trends.region);

        PipelineBuilder::new(source, provider)
            .year(config.trends.year)
            .region(&config.trends.region)
            .threshold(config.detection.threshold)
            .explain_concurrency(config.detection.explain_concurrency)
            .build()
    }

    /// Status of the explanation provider this pipeline runs with
    pub fn provider_status(&self) -> ProviderStatus {
        self.provider.status()
    }

    /// Shared explanation cache
    pub fn cache(&self) -> &Arc<ExplanationCache> {
        &self.cache
    }

    /// Run one analysis for `keyword`
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` for a blank keyword
    /// - `Error::Fetch` when the series cannot be retrieved
    ///
    /// Explanation failures never fail the run.
    pub async fn run(&self, keyword: &str) -> Result<AnalysisReport> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(Error::InvalidInput("keyword is empty".to_string()));
        }

        let query = TrendQuery::new(keyword, self.year, self.region.as_str());
        let series = self.source.fetch(&query).await?;

        let anomalies = self.detector.detect(&series);
        tracing::info!(
            keyword = %keyword,
            weeks = series.len(),
            anomalies = anomalies.len(),
            threshold = self.detector.threshold(),
            "Anomaly detection complete"
        );

        let analyzed = self.explain_all(keyword, anomalies).await;
        let stats = self.cache.stats();
        tracing::debug!(
            hits = stats.hits,
            misses = stats.misses,
            hit_rate = stats.hit_rate(),
            "Explanation cache"
        );

        Ok(AnalysisReport {
            series,
            anomalies: analyzed,
            provider: self.provider.status(),
            threshold: self.detector.threshold(),
        })
    }

    /// Explain anomalies concurrently, keeping chronological order
    async fn explain_all(&self, keyword: &str, anomalies: Vec<Anomaly>) -> Vec<AnalyzedAnomaly> {
        stream::iter(anomalies)
            .map(|anomaly| async move {
                let identity = anomaly.identity(keyword);
                let explanation = self
                    .cache
                    .get_or_compute(identity, || {
                        explain_with_fallback(self.provider.as_ref(), &anomaly, keyword)
                    })
                    .await;
                AnalyzedAnomaly {
                    anomaly,
                    explanation,
                }
            })
            .buffered(self.explain_concurrency)
            .collect()
            .await
    }
}

/// Builder for [`Pipeline`] with injectable collaborators
pub struct PipelineBuilder {
    source: Arc<dyn TrendSource>,
    provider: Arc<dyn ExplanationProvider>,
    cache: Option<Arc<ExplanationCache>>,
    threshold: Option<f64>,
    year: i32,
    region: String,
    explain_concurrency: usize,
}

impl PipelineBuilder {
    /// Create a new builder
    ///
    /// # Arguments
    ///
    /// * `source` - Where weekly interest series come from
    /// * `provider` - Generates explanations for flagged weeks
    pub fn new(source: Arc<dyn TrendSource>, provider: Arc<dyn ExplanationProvider>) -> Self {
        Self {
            source,
            provider,
            cache: None,
            threshold: None,
            year: DEFAULT_YEAR,
            region: DEFAULT_REGION.to_string(),
            explain_concurrency: 4,
        }
    }

    /// Share an existing cache instead of creating a fresh one
    pub fn cache(mut self, cache: Arc<ExplanationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the change threshold fraction
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Set the observation year
    pub fn year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    /// Set the region code
    pub fn region(mut self, region: &str) -> Self {
        self.region = region.to_string();
        self
    }

    /// Set how many explanations may be generated at once
    pub fn explain_concurrency(mut self, count: usize) -> Self {
        self.explain_concurrency = count;
        self
    }

    /// Build the pipeline
    ///
    /// # Errors
    ///
    /// Returns `Error::Detect` for an invalid threshold
    pub fn build(self) -> Result<Pipeline> {
        let detector = match self.threshold {
            Some(threshold) => AnomalyDetector::new(threshold)?,
            None => AnomalyDetector::default(),
        };

        Ok(Pipeline {
            source: self.source,
            provider: self.provider,
            cache: self.cache.unwrap_or_default(),
            detector,
            year: self.year,
            region: self.region,
            explain_concurrency: self.explain_concurrency.max(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::DemoProvider;
    use crate::models::{ExplanationSource, TrendPoint, TrendSeries};
    use crate::utils::error::FetchError;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};

    struct StaticSource(Vec<u32>);

    #[async_trait]
    impl TrendSource for StaticSource {
        async fn fetch(&self, query: &TrendQuery) -> std::result::Result<TrendSeries, FetchError> {
            let start = NaiveDate::from_ymd_opt(query.year, 1, 1).unwrap();
            let points = self
                .0
                .iter()
                .enumerate()
                .map(|(i, &v)| TrendPoint::new(start + Duration::weeks(i as i64), v))
                .collect();
            Ok(TrendSeries::new(query.clone(), points))
        }
    }

    fn pipeline(values: Vec<u32>) -> Pipeline {
        PipelineBuilder::new(
            Arc::new(StaticSource(values)),
            Arc::new(DemoProvider::default()),
        )
        .build()
        .unwrap()
    }

    #[tokio::test]
    async fn test_run_with_demo_provider() {
        let report = pipeline(vec![100, 135, 90, 91]).run("rust").await.unwrap();

        assert_eq!(report.series.len(), 4);
        assert_eq!(report.anomalies.len(), 2);
        assert!(report
            .anomalies
            .iter()
            .all(|a| a.explanation.source == ExplanationSource::Demo));
        assert!(!report.provider.is_live());
        assert_eq!(report.threshold, 0.30);
    }

    #[tokio::test]
    async fn test_blank_keyword_rejected() {
        let result = pipeline(vec![1, 2]).run("   ").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let result = PipelineBuilder::new(
            Arc::new(StaticSource(vec![])),
            Arc::new(DemoProvider::default()),
        )
        .threshold(0.0)
        .build();
        assert!(matches!(result, Err(Error::Detect(_))));
    }

    #[tokio::test]
    async fn test_rerun_reuses_cache() {
        let pipeline = pipeline(vec![100, 135, 90, 91]);
        pipeline.run("rust").await.unwrap();
        pipeline.run("Rust").await.unwrap();

        let stats = pipeline.cache().stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hits, 2);
    }
}
