//! Errors returned by `CatalogClient`
//!
use snafu::prelude::*;

/// Errors returned by catalog crate
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CatalogError {
    // Http connection or timeout error
    #[snafu(display("HTTP error {method} url:{url}"))]
    Http {
        method: String,
        url: String,
        source: reqwest::Error,
    },

    /// Catalog server responded with error.
    /// This error usually means the request was invalid, or there was an internal server error.
    #[snafu(display("Api Server reported error ({code}) {method} {url}: {message}"))]
    ApiError {
        code: u16,
        method: String,
        url: String,
        message: String,
    },

    /// Encountered server error on "retryable" request, but all retry attempts failed.
    #[snafu(display("server api request: failed {n} times"))]
    TooManyRetries { n: u32 },

    /// Deserialization error. The server payload did not have the expected shape.
    #[snafu(display("Deserialization at {path}: {source}"))]
    Deserialization {
        path: String,
        source: serde_json::Error,
    },

    /// Expected item was not found.
    #[snafu(display("{obj_type} {key} not found"))]
    NotFound { obj_type: String, key: String },

    /// Too many requests occurred, and the server's requested wait was too long
    /// or could not be parsed.
    #[snafu(display("Rate limit exceeded: \"{header}\" (parsed wait_time: {} secs)", duration.as_secs()))]
    RateLimitExceeded {
        header: String,
        duration: std::time::Duration,
    },

    /// Validation error: an internal parameter validation check failed.
    #[snafu(display("Validation error: {message}"))]
    Validation { message: String },

    /// Some other error occurred
    #[snafu(display("{message}"))]
    Other { message: String },
}

impl CatalogError {
    /// True for failures that may succeed if the same request is sent again
    /// (connection problems, timeouts, server errors, rate limits).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { source, .. } => source.is_connect() || source.is_timeout(),
            Self::ApiError { code, .. } => *code >= 500 || *code == 408 || *code == 429,
            Self::TooManyRetries { .. } | Self::RateLimitExceeded { .. } => true,
            Self::Deserialization { .. }
            | Self::NotFound { .. }
            | Self::Validation { .. }
            | Self::Other { .. } => false,
        }
    }
}
