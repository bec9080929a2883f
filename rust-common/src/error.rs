//! Transport-level error types and HTTP status classification.
//!
//! `PlatformError` is what the HTTP boundary raises when no usable response was
//! obtained. Transports normally hand non-success responses back as values for
//! callers to classify with [`StatusClass`]; `PlatformError::Status` covers
//! transports that raise them instead.

use thiserror::Error;

/// Transport-level failure raised below the request orchestration layer.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Non-success status raised as an error by the transport
    #[error("HTTP status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Network I/O failure reported by a non-reqwest transport
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout occurred
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlatformError {
    /// Check if this error is a transient I/O failure worth retrying.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_common::PlatformError;
    ///
    /// assert!(PlatformError::network("connection reset").is_retryable());
    /// assert!(!PlatformError::invalid_input("bad url").is_retryable());
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Http(e) => e.is_connect() || e.is_timeout() || e.is_request() || e.is_body(),
            Self::Status { status, .. } => {
                matches!(StatusClass::from_status(*status), StatusClass::Transient)
            }
            Self::Serialization(_) | Self::InvalidInput(_) | Self::Internal(_) => false,
        }
    }

    /// HTTP status carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Create a status error.
    #[must_use]
    pub fn status_error(status: u16, body: impl Into<String>) -> Self {
        Self::Status { status, body: body.into() }
    }

    /// Create a network error with the given message.
    #[must_use]
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a timeout error with the given message.
    #[must_use]
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an invalid input error with the given message.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Coarse classification of an HTTP status code for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx
    Success,
    /// 401, the bearer token was rejected
    Unauthorized,
    /// 429 or 5xx, may succeed on a later attempt
    Transient,
    /// Any other status; retrying will not help
    Permanent,
}

impl StatusClass {
    /// Classify a raw HTTP status code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Self::Success,
            401 => Self::Unauthorized,
            429 | 500..=599 => Self::Transient,
            _ => Self::Permanent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(PlatformError::network("reset").is_retryable());
        assert!(PlatformError::timeout("read").is_retryable());
    }

    #[test]
    fn test_non_retryable_errors() {
        assert!(!PlatformError::invalid_input("test").is_retryable());
        assert!(!PlatformError::Internal("test".to_string()).is_retryable());
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!PlatformError::from(json_err).is_retryable());
    }

    #[test]
    fn test_status_errors() {
        assert!(PlatformError::status_error(503, "down").is_retryable());
        assert!(PlatformError::status_error(429, "slow down").is_retryable());
        assert!(!PlatformError::status_error(419, "").is_retryable());
        assert_eq!(PlatformError::status_error(419, "").status(), Some(419));
        assert_eq!(PlatformError::network("x").status(), None);
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(StatusClass::from_status(200), StatusClass::Success);
        assert_eq!(StatusClass::from_status(204), StatusClass::Success);
        assert_eq!(StatusClass::from_status(401), StatusClass::Unauthorized);
        assert_eq!(StatusClass::from_status(429), StatusClass::Transient);
        assert_eq!(StatusClass::from_status(500), StatusClass::Transient);
        assert_eq!(StatusClass::from_status(503), StatusClass::Transient);
        assert_eq!(StatusClass::from_status(400), StatusClass::Permanent);
        assert_eq!(StatusClass::from_status(419), StatusClass::Permanent);
    }

    #[test]
    fn test_error_display() {
        let err = PlatformError::network("connection refused");
        assert_eq!(err.to_string(), "Network error: connection refused");
    }
}
