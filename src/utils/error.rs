//! Error types for trend retrieval and explanation generation
//!
//! This module defines custom error types used throughout the application.

use thiserror::Error;

/// Errors that can occur while fetching a trend series
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider kept answering 429 until the attempt budget ran out
    #[error("Rate limit exceeded after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// Provider answered but the keyword has no measurable search volume
    #[error("No trend data for keyword '{keyword}'")]
    NoData { keyword: String },

    /// Non-retryable HTTP status
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// Server error that survived every retry
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Response body could not be understood
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether another attempt could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::ServerError(_) | Self::Timeout => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Errors that can occur while generating an explanation
#[derive(Error, Debug)]
pub enum ExplainError {
    /// No usable credential, or the provider rejected it
    #[error("Explanation provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The remote call errored, timed out or returned nothing usable
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

impl From<reqwest::Error> for ExplainError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::GenerationFailed("request timed out".to_string())
        } else {
            Self::GenerationFailed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::RateLimited { attempts: 1 }.is_transient());
        assert!(FetchError::ServerError(503).is_transient());
        assert!(FetchError::Timeout.is_transient());
        assert!(!FetchError::Status(404).is_transient());
        assert!(!FetchError::NoData {
            keyword: "x".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_messages() {
        let err = FetchError::RateLimited { attempts: 3 };
        assert_eq!(err.to_string(), "Rate limit exceeded after 3 attempts");

        let err = ExplainError::GenerationFailed("boom".to_string());
        assert_eq!(err.to_string(), "Generation failed: boom");
    }
}
