//! Error types for the load test tool.

use thiserror::Error;

/// Result type alias using LoadTestError.
pub type LoadTestResult<T> = Result<T, LoadTestError>;

/// Primary error type for load test operations.
#[derive(Debug, Error)]
pub enum LoadTestError {
    #[error("invalid value '{value}' for {var}: {message}")]
    InvalidThreshold {
        var: &'static str,
        value: String,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid proxy URL '{url}': {source}")]
    InvalidProxy { url: String, source: reqwest::Error },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    #[error("malformed distributions response: {0}")]
    MalformedDistributions(#[from] serde_json::Error),
}
