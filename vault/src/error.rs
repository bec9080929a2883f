//! Vault error types using thiserror 2.0.
//!
//! Every component returns [`VaultResult`]: `Ok` carries the payload, `Err`
//! carries a [`VaultError`] whose `Display` is the caller-facing message.

use rust_common::PlatformError;
use thiserror::Error;

/// Errors raised by the tokenization client.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Request rejected before any I/O (empty or oversized batch)
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Token exchange returned a non-success status
    #[error("Authentication failed: HTTP {status} - {body}")]
    AuthenticationFailed {
        /// HTTP status of the token endpoint
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Remote operation returned a non-success status
    #[error("Failed to {operation}: HTTP {status} - {body}")]
    Http {
        /// Operation name, e.g. `tokenize`
        operation: &'static str,
        /// HTTP status
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Encrypted response could not be decrypted or parsed
    #[error("Failed to decrypt response")]
    DecryptionFailed,

    /// Encrypted response reached a strategy that cannot decrypt it
    #[error("Encryption strategy mismatch")]
    StrategyMismatch,

    /// The encryption collaborator failed
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Detokenized value could not be converted to the requested type
    #[error("Cannot convert detokenized value to {value_type}")]
    Conversion {
        /// Target type name
        value_type: &'static str,
        /// Raw value returned by the vault
        value: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Transport-level failure
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    /// Check if error is a transient transport failure.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Platform(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// HTTP status carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationFailed { status, .. } | Self::Http { status, .. } => Some(*status),
            Self::Platform(e) => e.status(),
            _ => None,
        }
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an encryption error.
    #[must_use]
    pub fn encryption(msg: impl Into<String>) -> Self {
        Self::Encryption(msg.into())
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<reqwest::Error> for VaultError {
    fn from(err: reqwest::Error) -> Self {
        Self::Platform(PlatformError::from(err))
    }
}
