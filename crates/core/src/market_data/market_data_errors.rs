//! Error types for quote source operations.

use thiserror::Error;

/// Errors that can occur while fetching quotes from the source.
#[derive(Error, Debug)]
pub enum QuoteSourceError {
    /// A network error occurred while communicating with the source.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request to the source timed out.
    #[error("Timeout: {source_id}")]
    Timeout {
        /// The source that timed out
        source_id: String,
    },

    /// The source rejected the credentials (HTTP 401/403).
    #[error("Authentication failed: {source_id}")]
    AuthFailed {
        /// The source that rejected the request
        source_id: String,
    },

    /// The source rate limited the request (HTTP 429).
    #[error("Rate limited: {source_id}")]
    RateLimited {
        /// The source that rate limited the request
        source_id: String,
    },

    /// The source answered with a payload that could not be interpreted.
    #[error("Bad response from {source_id}: {message}")]
    BadResponse {
        /// The source that returned the payload
        source_id: String,
        /// What was wrong with it
        message: String,
    },
}

impl QuoteSourceError {
    /// Whether a retry within the same tick could plausibly succeed.
    ///
    /// Auth failures and malformed payloads are terminal for the tick;
    /// network hiccups, timeouts, and rate limits are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout { .. } | Self::RateLimited { .. } => true,
            Self::AuthFailed { .. } | Self::BadResponse { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_transient() {
        let error = QuoteSourceError::Timeout {
            source_id: "BROKER_HTTP".to_string(),
        };
        assert!(error.is_transient());
    }

    #[test]
    fn test_auth_failure_is_terminal() {
        let error = QuoteSourceError::AuthFailed {
            source_id: "BROKER_HTTP".to_string(),
        };
        assert!(!error.is_transient());
    }

    #[test]
    fn test_bad_response_is_terminal() {
        let error = QuoteSourceError::BadResponse {
            source_id: "BROKER_HTTP".to_string(),
            message: "missing data field".to_string(),
        };
        assert!(!error.is_transient());
    }
}
