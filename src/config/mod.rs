//! Configuration management for trendlens
//!
//! This module handles loading and validating configuration from environment variables,
//! files, and command-line arguments.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::analytics::DEFAULT_THRESHOLD;
use crate::error::{Error, Result};
use crate::llm::LlmConfig;
use crate::models::{DEFAULT_REGION, DEFAULT_YEAR};
use crate::utils::retry::RetryConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Trend provider configuration
    pub trends: TrendsConfig,

    /// Language model configuration
    pub llm: LlmConfig,

    /// Anomaly detection configuration
    pub detection: DetectionConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Trend provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendsConfig {
    /// Provider base URL (overridable for mock servers)
    pub base_url: String,

    /// Observation year
    pub year: i32,

    /// Two-letter geography code
    pub region: String,

    /// Host language sent to the provider
    pub language: String,

    /// Timezone offset in minutes sent to the provider
    pub tz_offset: i32,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Client-side pacing (requests per minute)
    pub requests_per_minute: u32,

    /// Total attempts per logical fetch
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds
    pub base_delay_ms: u64,

    /// Backoff cap in milliseconds
    pub max_delay_ms: u64,

    /// Random jitter band in milliseconds
    pub jitter_ms: u64,
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://trends.google.com"),
            year: DEFAULT_YEAR,
            region: String::from(DEFAULT_REGION),
            language: String::from("en-US"),
            tz_offset: 360,
            request_timeout_secs: 30,
            requests_per_minute: 10,
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            jitter_ms: 2000,
        }
    }
}

impl TrendsConfig {
    /// Backoff policy for the fetcher
    #[must_use]
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            jitter_ms: self.jitter_ms,
            ..RetryConfig::with_delays(self.max_attempts, self.base_delay_ms, self.max_delay_ms)
        }
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Anomaly detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Week-over-week change fraction that flags an anomaly
    pub threshold: f64,

    /// Maximum explanations generated at once
    pub explain_concurrency: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            explain_concurrency: 4,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl LoggingConfig {
    /// Logging settings from the defaults and `TRENDLENS_LOG_*`
    ///
    /// The binary reads these before any config file is loaded.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(level) = std::env::var("TRENDLENS_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(format) = std::env::var("TRENDLENS_LOG_FORMAT") {
            self.format = format;
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Config {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let config = Self::load(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let config = Self::load(Some(path))?;
        config.validate()?;
        Ok(config)
    }

    /// Layer defaults, an optional TOML file and the environment without validating
    ///
    /// Callers that apply further overrides (CLI flags) validate once afterwards.
    ///
    /// # Arguments
    ///
    /// * `path` - Optional TOML file; `None` starts from defaults
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be read or parsed
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::config(format!(
                        "Failed to read config file {}: {e}",
                        path.display()
                    ))
                })?;
                toml::from_str(&content).map_err(|e| {
                    Error::config(format!(
                        "Failed to parse TOML config file {}: {e}",
                        path.display()
                    ))
                })?
            }
            None => Self::default(),
        };

        config.apply_env();
        config.trends.region = config.trends.region.trim().to_uppercase();
        Ok(config)
    }

    fn apply_env(&mut self) {
        let trends = &mut self.trends;
        if let Ok(url) = std::env::var("TRENDLENS_TRENDS_URL") {
            trends.base_url = url;
        }
        if let Some(year) = env_parse("TRENDLENS_YEAR") {
            trends.year = year;
        }
        if let Ok(region) = std::env::var("TRENDLENS_REGION") {
            trends.region = region.trim().to_uppercase();
        }
        if let Some(timeout) = env_parse("TRENDLENS_REQUEST_TIMEOUT") {
            trends.request_timeout_secs = timeout;
        }
        if let Some(attempts) = env_parse("TRENDLENS_MAX_ATTEMPTS") {
            trends.max_attempts = attempts;
        }
        if let Some(rpm) = env_parse("TRENDLENS_REQUESTS_PER_MINUTE") {
            trends.requests_per_minute = rpm;
        }

        if let Some(threshold) = env_parse("TRENDLENS_THRESHOLD") {
            self.detection.threshold = threshold;
        }
        if let Some(concurrency) = env_parse("TRENDLENS_EXPLAIN_CONCURRENCY") {
            self.detection.explain_concurrency = concurrency;
        }

        self.llm.apply_env();

        self.logging.apply_env();
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first invalid setting
    pub fn validate(&self) -> Result<()> {
        if self.trends.max_attempts == 0 {
            return Err(Error::config("max_attempts must be greater than 0"));
        }

        if self.trends.requests_per_minute == 0 {
            return Err(Error::config("requests_per_minute must be greater than 0"));
        }

        if !(1900..=2100).contains(&self.trends.year) {
            return Err(Error::config(format!(
                "year {} is out of range",
                self.trends.year
            )));
        }

        // Empty means worldwide
        let region = &self.trends.region;
        if !region.is_empty()
            && !(region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic()))
        {
            return Err(Error::config(format!(
                "region '{region}' must be a two-letter country code"
            )));
        }

        if !self.detection.threshold.is_finite() || self.detection.threshold <= 0.0 {
            return Err(Error::config("threshold must be positive"));
        }

        if self.detection.explain_concurrency == 0 {
            return Err(Error::config("explain_concurrency must be greater than 0"));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::config("temperature must be between 0.0 and 2.0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_threshold() {
        let mut config = Config::default();
        config.detection.threshold = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_region_codes() {
        let mut config = Config::default();
        for region in ["US", "gb", ""] {
            config.trends.region = region.to_string();
            assert!(config.validate().is_ok(), "{region:?} should be accepted");
        }
        for region in ["U", "USA", "1A", "Ü1"] {
            config.trends.region = region.to_string();
            assert!(
                matches!(config.validate(), Err(Error::Config(_))),
                "{region:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_attempts() {
        let mut config = Config::default();
        config.trends.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_timeout_conversion() {
        let config = Config::default();
        assert_eq!(config.trends.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_retry_config_mapping() {
        let config = TrendsConfig::default();
        let retry = config.retry_config();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.jitter_ms, 2000);
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [trends]
            year = 2022
            region = "GB"

            [detection]
            threshold = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.trends.year, 2022);
        assert_eq!(config.trends.region, "GB");
        assert_eq!(config.trends.max_attempts, 3);
        assert_eq!(config.detection.threshold, 0.5);
        assert_eq!(config.llm.max_tokens, 100);
    }
}
