//! Trend series retrieval
//!
//! [`TrendsFetcher`] talks to the remote trend provider; [`TrendSource`] is the
//! seam the pipeline depends on, so tests can drive it with canned series.

pub mod fetcher;
pub mod protocol;

use async_trait::async_trait;

use crate::models::{TrendQuery, TrendSeries};
use crate::utils::error::FetchError;

pub use fetcher::TrendsFetcher;

/// Anything that can produce a weekly interest series for a query
#[async_trait]
pub trait TrendSource: Send + Sync {
    /// Fetch the series for `query`
    ///
    /// Fails with `FetchError::RateLimited` once retries are exhausted and
    /// with `FetchError::NoData` when the keyword has no measurable volume.
    async fn fetch(&self, query: &TrendQuery) -> Result<TrendSeries, FetchError>;
}
