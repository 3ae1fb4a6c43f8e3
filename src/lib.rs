//! trendlens - Search-interest anomaly explorer
//!
//! Fetches a keyword's weekly search-interest series, flags weeks whose
//! interest moved sharply from the prior week, and explains each flagged week
//! with a hosted language model (or a deterministic demo template).
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`trends`] - Trend provider client with retry and rate limiting
//! - [`analytics`] - Week-over-week anomaly detection
//! - [`llm`] - Chat-completion client and credential resolution
//! - [`explain`] - Live and demo explanation providers
//! - [`cache`] - Session-scoped explanation cache
//! - [`pipeline`] - Fetch → detect → explain orchestration
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use trendlens::config::Config;
//! use trendlens::llm::Credential;
//! use trendlens::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let pipeline = Pipeline::from_config(&config, Credential::from_input_or_env(None))?;
//!     let report = pipeline.run("electric cars").await?;
//!     println!("{} anomalies", report.anomalies.len());
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod explain;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod trends;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analytics::AnomalyDetector;
    pub use crate::cache::ExplanationCache;
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result, TrendlensErrorTrait};
    pub use crate::explain::{DemoProvider, ExplanationProvider, LiveProvider};
    pub use crate::llm::Credential;
    pub use crate::models::{
        AnalysisReport, Anomaly, Direction, Explanation, ExplanationSource, TrendSeries,
    };
    pub use crate::pipeline::{Pipeline, PipelineBuilder};
    pub use crate::trends::{TrendSource, TrendsFetcher};
}

// Direct re-exports for convenience
pub use models::{AnalysisReport, Anomaly, Direction, Explanation, ExplanationSource, TrendSeries};
