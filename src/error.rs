//! Unified error handling for the trendlens crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`TrendlensErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use trendlens::error::{Error, TrendlensErrorTrait};
//!
//! fn report(err: &Error) {
//!     eprintln!("{err}");
//!     eprintln!("{}", err.guidance());
//! }
//! ```

use thiserror::Error;

pub use crate::analytics::DetectError;
pub use crate::utils::error::{ExplainError, FetchError};

/// Common trait for all trendlens error types
pub trait TrendlensErrorTrait: std::error::Error {
    /// Check if this error is recoverable (a later retry may succeed)
    fn is_recoverable(&self) -> bool;

    /// User-facing guidance on what to do next
    fn guidance(&self) -> String;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, rate limit)
    Network,
    /// The provider had nothing usable for the request
    Data,
    /// LLM and explanation errors
    Llm,
    /// Configuration and validation errors
    Config,
}

impl ErrorCategory {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "network error",
            Self::Data => "data error",
            Self::Llm => "LLM error",
            Self::Config => "configuration error",
        }
    }
}

impl TrendlensErrorTrait for FetchError {
    fn is_recoverable(&self) -> bool {
        self.is_transient()
    }

    fn guidance(&self) -> String {
        match self {
            Self::RateLimited { .. } => {
                "Rate limit exceeded. Please wait a few minutes before trying again.".to_string()
            }
            Self::NoData { .. } => "No trend data found. Try another keyword.".to_string(),
            Self::Timeout | Self::Http(_) | Self::ServerError(_) => {
                "The trend provider is unreachable right now. Try again later.".to_string()
            }
            Self::Status(_) | Self::Decode(_) | Self::InvalidUrl(_) => {
                format!("The trend provider returned an unexpected response: {self}")
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::NoData { .. } => ErrorCategory::Data,
            Self::InvalidUrl(_) => ErrorCategory::Config,
            _ => ErrorCategory::Network,
        }
    }
}

impl TrendlensErrorTrait for ExplainError {
    fn is_recoverable(&self) -> bool {
        matches!(self, Self::GenerationFailed(_))
    }

    fn guidance(&self) -> String {
        match self {
            Self::ProviderUnavailable(_) => {
                "Set OPENAI_API_KEY or pass --api-key for live explanations.".to_string()
            }
            Self::GenerationFailed(_) => {
                "The explanation could not be generated; a demo explanation is shown instead."
                    .to_string()
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Llm
    }
}

/// Unified error type for the trendlens crate
#[derive(Error, Debug)]
pub enum Error {
    /// Trend retrieval errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Explanation errors
    #[error("Explanation error: {0}")]
    Explain(#[from] ExplainError),

    /// Anomaly detection errors
    #[error("Detection error: {0}")]
    Detect(#[from] DetectError),

    /// Rejected user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unreadable or invalid configuration
    #[error("Config error: {0}")]
    Config(String),
}

impl TrendlensErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Explain(e) => e.is_recoverable(),
            Self::Detect(_) | Self::InvalidInput(_) | Self::Config(_) => false,
        }
    }

    fn guidance(&self) -> String {
        match self {
            Self::Fetch(e) => e.guidance(),
            Self::Explain(e) => e.guidance(),
            Self::Detect(e) => format!("Check the threshold setting: {e}"),
            Self::InvalidInput(msg) => format!("Enter a keyword or phrase ({msg})."),
            Self::Config(msg) => format!("Fix the configuration: {msg}"),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(e) => e.category(),
            Self::Explain(e) => e.category(),
            Self::Detect(_) | Self::Config(_) | Self::InvalidInput(_) => ErrorCategory::Config,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
