//! HTTP fetcher for weekly trend series
//!
//! This module provides the trend provider client with features including:
//! - User-Agent rotation
//! - Client-side pacing with governor
//! - Retry with exponential backoff and jitter on rate limits and 5xx
//! - Distinct failures for rate limiting and empty results

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use rand::seq::SliceRandom;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT},
    Client, StatusCode,
};
use std::num::NonZeroU32;
use url::Url;

use super::protocol::{explore_request, parse_explore, parse_timeline, TimeseriesWidget};
use super::TrendSource;
use crate::config::TrendsConfig;
use crate::models::{TrendPoint, TrendQuery, TrendSeries};
use crate::utils::error::FetchError;
use crate::utils::retry::{with_retry_if, RetryConfig};

/// Pool of realistic User-Agent strings for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

const EXPLORE_PATH: &str = "/trends/api/explore";
const MULTILINE_PATH: &str = "/trends/api/widgetdata/multiline";

/// Trend provider client
///
/// One call to [`TrendsFetcher::fetch`] is one logical request: the explore
/// step and the timeline step are retried together.
pub struct TrendsFetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// Backoff policy for rate-limited and transient failures
    retry: RetryConfig,

    base_url: String,
    language: String,
    tz_offset: i32,
}

impl TrendsFetcher {
    /// Create a fetcher from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Provider URL, locale, attempt budget and pacing
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &TrendsConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .gzip(true)
            .cookie_store(true)
            .build()?;

        let rate = NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_minute(rate));

        Ok(Self {
            client,
            rate_limiter,
            retry: config.retry_config(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            tz_offset: config.tz_offset,
        })
    }

    /// Attempt budget of one logical fetch
    pub fn max_attempts(&self) -> u32 {
        self.retry.max_attempts
    }

    /// Fetch the weekly series for a query, retrying rate limits and transient errors
    ///
    /// # Errors
    ///
    /// - `FetchError::RateLimited` when every attempt was rate limited
    /// - `FetchError::NoData` when the provider has no data for the keyword
    /// - other variants for transport and decoding failures
    pub async fn fetch(&self, query: &TrendQuery) -> Result<TrendSeries, FetchError> {
        tracing::info!(
            keyword = %query.keyword,
            year = query.year,
            region = %query.region,
            "Fetching trend series"
        );

        let series = with_retry_if(
            &self.retry,
            |attempt| self.fetch_once(query, attempt),
            FetchError::is_transient,
        )
        .await?;

        tracing::info!(
            keyword = %query.keyword,
            weeks = series.len(),
            gaps = series.gaps().len(),
            "Trend series fetched"
        );
        Ok(series)
    }

    async fn fetch_once(&self, query: &TrendQuery, attempt: u32) -> Result<TrendSeries, FetchError> {
        let widget = self.explore(query, attempt).await?;
        let points = self.timeline(&widget, attempt).await?;

        if points.is_empty() {
            return Err(FetchError::NoData {
                keyword: query.keyword.clone(),
            });
        }

        Ok(TrendSeries::new(query.clone(), points))
    }

    async fn explore(&self, query: &TrendQuery, attempt: u32) -> Result<TimeseriesWidget, FetchError> {
        let req = explore_request(query).to_string();
        let url = self.endpoint(EXPLORE_PATH, &[("req", req.as_str())])?;
        let body = self.get(url, attempt).await?;
        parse_explore(&body)
    }

    async fn timeline(
        &self,
        widget: &TimeseriesWidget,
        attempt: u32,
    ) -> Result<Vec<TrendPoint>, FetchError> {
        let req = widget.request.to_string();
        let url = self.endpoint(
            MULTILINE_PATH,
            &[("req", req.as_str()), ("token", widget.token.as_str())],
        )?;
        let body = self.get(url, attempt).await?;
        parse_timeline(&body)
    }

    /// Build an endpoint URL with the common `hl`/`tz` parameters
    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, FetchError> {
        let tz = self.tz_offset.to_string();
        let mut all = vec![("hl", self.language.as_str()), ("tz", tz.as_str())];
        all.extend_from_slice(params);

        Url::parse_with_params(&format!("{}{path}", self.base_url), &all)
            .map_err(|e| FetchError::InvalidUrl(format!("{}{path}: {e}", self.base_url)))
    }

    /// Paced GET returning the body, classifying failures for the retry loop
    async fn get(&self, url: Url, attempt: u32) -> Result<String, FetchError> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(url)
            .headers(self.build_headers())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Http(e)
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited { attempts: attempt });
        }
        if Self::should_retry(status.as_u16()) {
            return Err(FetchError::ServerError(status.as_u16()));
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    /// Server errors worth another attempt
    fn should_retry(status: u16) -> bool {
        matches!(status, 500 | 502 | 503 | 504)
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(self.random_user_agent()));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        if let Ok(language) = HeaderValue::from_str(&self.language) {
            headers.insert(ACCEPT_LANGUAGE, language);
        }
        headers
    }

    /// Get a random user agent from the pool
    fn random_user_agent(&self) -> &'static str {
        let mut rng = rand::thread_rng();
        USER_AGENTS.choose(&mut rng).unwrap_or(&USER_AGENTS[0])
    }
}

#[async_trait]
impl TrendSource for TrendsFetcher {
    async fn fetch(&self, query: &TrendQuery) -> Result<TrendSeries, FetchError> {
        TrendsFetcher::fetch(self, query).await
    }
}
