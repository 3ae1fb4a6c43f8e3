//! Configuration loading tests
//!
//! Tests that touch process environment are serialized.

use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;
use trendlens::config::{Config, LoggingConfig};
use trendlens::error::Error;
use trendlens::llm::{Credential, API_KEY_ENV};

const ENV_KEYS: &[&str] = &[
    "TRENDLENS_YEAR",
    "TRENDLENS_REGION",
    "TRENDLENS_THRESHOLD",
    "TRENDLENS_MAX_ATTEMPTS",
    "TRENDLENS_EXPLAIN_CONCURRENCY",
    "OPENAI_MODEL",
    "TRENDLENS_LOG_LEVEL",
    "TRENDLENS_LOG_FORMAT",
    API_KEY_ENV,
];

fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_from_file_partial() {
    clear_env();
    let file = write_config(
        r#"
[trends]
year = 2022
region = "GB"
max_attempts = 5

[detection]
threshold = 0.5

[llm]
model = "gpt-4o"
"#,
    );

    let config = Config::from_file(file.path()).unwrap();

    assert_eq!(config.trends.year, 2022);
    assert_eq!(config.trends.region, "GB");
    assert_eq!(config.trends.max_attempts, 5);
    assert_eq!(config.trends.requests_per_minute, 10);
    assert_eq!(config.detection.threshold, 0.5);
    assert_eq!(config.detection.explain_concurrency, 4);
    assert_eq!(config.llm.model, "gpt-4o");
    assert_eq!(config.llm.max_tokens, 100);
}

#[test]
#[serial]
fn test_from_file_rejects_invalid_values() {
    clear_env();
    let file = write_config("[detection]\nthreshold = -0.1\n");
    assert!(matches!(
        Config::from_file(file.path()),
        Err(Error::Config(_))
    ));

    let file = write_config("[trends]\nmax_attempts = 0\n");
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
#[serial]
fn test_from_file_missing_or_malformed() {
    clear_env();
    assert!(Config::from_file(std::path::Path::new("/nonexistent/trendlens.toml")).is_err());

    let file = write_config("[trends\nyear = ");
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let file = write_config("[trends]\nyear = 2022\nregion = \"GB\"\n");

    std::env::set_var("TRENDLENS_YEAR", "2021");
    std::env::set_var("TRENDLENS_REGION", "de");
    std::env::set_var("TRENDLENS_THRESHOLD", "0.25");
    std::env::set_var("OPENAI_MODEL", "gpt-4.1-mini");

    let config = Config::from_file(file.path()).unwrap();
    clear_env();

    assert_eq!(config.trends.year, 2021);
    assert_eq!(config.trends.region, "DE");
    assert_eq!(config.detection.threshold, 0.25);
    assert_eq!(config.llm.model, "gpt-4.1-mini");
}

#[test]
#[serial]
fn test_from_env_ignores_unparseable_values() {
    clear_env();
    std::env::set_var("TRENDLENS_MAX_ATTEMPTS", "many");
    std::env::set_var("TRENDLENS_EXPLAIN_CONCURRENCY", "8");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.trends.max_attempts, 3);
    assert_eq!(config.detection.explain_concurrency, 8);
}

#[test]
#[serial]
fn test_from_env_invalid_threshold_fails() {
    clear_env();
    std::env::set_var("TRENDLENS_THRESHOLD", "0");

    let result = Config::from_env();
    clear_env();

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_credential_from_env() {
    clear_env();
    assert!(Credential::from_input_or_env(None).is_none());

    std::env::set_var(API_KEY_ENV, "YOUR_OPENAI_API_KEY_HERE");
    assert!(Credential::from_input_or_env(None).is_none());

    std::env::set_var(API_KEY_ENV, "sk-from-env");
    assert!(Credential::from_input_or_env(None).is_some());

    // Explicit input wins even when the environment has a key
    let explicit = Credential::from_input_or_env(Some("sk-explicit"));
    assert_eq!(explicit, Credential::new("sk-explicit"));

    clear_env();
}

#[test]
#[serial]
fn test_logging_from_env() {
    clear_env();
    let logging = LoggingConfig::from_env();
    assert_eq!(logging.level, "info");
    assert_eq!(logging.format, "text");

    std::env::set_var("TRENDLENS_LOG_LEVEL", "debug");
    std::env::set_var("TRENDLENS_LOG_FORMAT", "json");
    let logging = LoggingConfig::from_env();
    clear_env();

    assert_eq!(logging.level, "debug");
    assert_eq!(logging.format, "json");
}

#[test]
#[serial]
fn test_overrides_applied_before_validation() {
    clear_env();
    std::env::set_var("TRENDLENS_THRESHOLD", "0");

    // An invalid environment value alone fails validation
    let config = Config::load(None).unwrap();
    clear_env();
    assert!(matches!(config.validate(), Err(Error::Config(_))));

    // A later override repairs it before validation
    let mut config = config;
    config.detection.threshold = 0.4;
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_load_normalizes_region() {
    clear_env();
    let file = write_config("[trends]\nregion = \" gb \"\n");

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.trends.region, "GB");

    let file = write_config("[trends]\nregion = \"U\"\n");
    assert!(matches!(
        Config::from_file(file.path()),
        Err(Error::Config(_))
    ));
}
