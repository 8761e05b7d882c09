use thiserror::Error;

/// Application-wide error types for jobpilot.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request returned an unusable response.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Session credential rejected or expired for a platform.
    #[error("Session invalid for {0}")]
    SessionInvalid(String),

    /// Scoring service call failed.
    #[error("Scorer error (HTTP {status_code}): {message}")]
    ScorerError {
        message: String,
        status_code: u16,
        retryable: bool,
    },

    /// Response did not have the expected shape.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// An apply call was rejected by the platform.
    #[error("Application rejected: {0}")]
    ApplyRejected(String),

    /// Ledger read/write failed.
    #[error("Ledger error: {0}")]
    LedgerError(String),

    /// Invalid or incomplete configuration. Fatal at process start.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Returns true if this error is transport-level and worth retrying.
    ///
    /// Session, parse, apply, and ledger errors are never retried here;
    /// each has a stage-specific fallback instead.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) => true,
            AppError::ScorerError { retryable, .. } => *retryable,
            AppError::HttpError(msg) => {
                msg.contains("timeout") || msg.contains("connect") || msg.contains("reset")
            }
            _ => false,
        }
    }

    /// Returns true if this error should abort the whole process.
    ///
    /// Only configuration errors are fatal; everything else degrades to a
    /// per-platform failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Config(_))
    }
}
