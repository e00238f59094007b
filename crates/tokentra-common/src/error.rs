//! Error types for TokenTra
//!
//! Configuration and wrapping errors surface synchronously to the caller.
//! Delivery errors never reach application call sites; the telemetry pipeline
//! logs them and reflects them in its counters.

use thiserror::Error;

/// Result type alias using TokenTraError
pub type Result<T> = std::result::Result<T, TokenTraError>;

/// Unified error type for TokenTra operations
#[derive(Debug, Error)]
pub enum TokenTraError {
    // Credential errors
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    // Wrapping errors
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    // Transport errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Rate limit exceeded: {message} (retry after {retry_after_secs}s)")]
    RateLimit {
        message: String,
        retry_after_secs: u64,
    },

    #[error("Collector rejected batch with HTTP {status}: {message}")]
    Collector { status: u16, message: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TokenTraError {
    /// Default retry hint when the collector omits `Retry-After`
    pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

    /// Stable error code, matching the collector's vocabulary
    pub fn code(&self) -> &'static str {
        match self {
            TokenTraError::InvalidApiKey(_) => "INVALID_API_KEY",
            TokenTraError::UnsupportedProvider(_) => "UNSUPPORTED_PROVIDER",
            TokenTraError::Network(_) => "NETWORK_ERROR",
            TokenTraError::Timeout(_) => "TIMEOUT",
            TokenTraError::RateLimit { .. } => "RATE_LIMIT_EXCEEDED",
            TokenTraError::Collector { .. } => "TELEMETRY_FAILED",
            TokenTraError::Config(_) => "CONFIG_ERROR",
            TokenTraError::Serialization(_) => "SERIALIZATION_ERROR",
            TokenTraError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether a later attempt could succeed.
    ///
    /// Informational only: failed batches are counted and discarded, never
    /// requeued.
    pub fn is_retryable(&self) -> bool {
        match self {
            TokenTraError::Network(_)
            | TokenTraError::Timeout(_)
            | TokenTraError::RateLimit { .. } => true,
            TokenTraError::Collector { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Retry hint in seconds, if the error carries one
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            TokenTraError::RateLimit {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TokenTraError {
    fn from(err: serde_json::Error) -> Self {
        TokenTraError::Serialization(err.to_string())
    }
}
