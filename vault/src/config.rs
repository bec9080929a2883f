//! Tokenization client configuration.

use crate::error::{VaultError, VaultResult};
use rust_common::{HttpConfig, RetryConfig};
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

/// Largest batch accepted by `batch_tokenize`.
pub const MAX_BATCH_TOKENIZE: usize = 1000;
/// Largest batch accepted by `batch_detokenize`.
pub const MAX_BATCH_DETOKENIZE: usize = 10_000;

/// Tokenization client configuration.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Base URL the tokenization endpoints are resolved against
    pub base_url: String,
    /// Token endpoint for the client-credentials exchange
    pub auth_url: String,
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
    /// Additional attempts after the first call
    pub max_retries: u32,
    /// Base backoff delay
    pub initial_retry_delay: Duration,
    /// Cap for a single backoff delay
    pub max_retry_delay: Duration,
    /// Access tokens are treated as expired this long before their stated expiry
    pub token_expiry_buffer: Duration,
    /// Whether the value/token cache starts enabled
    pub cache_enabled: bool,
    /// Whether requests go through the encrypted endpoints
    pub encryption_enabled: bool,
    /// Base64-encoded AES-256 key shared with the vault service
    pub encryption_key: Option<SecretString>,
    /// Largest tokenize batch
    pub max_batch_tokenize: usize,
    /// Largest detokenize batch
    pub max_batch_detokenize: usize,
    /// Transport settings
    pub http: HttpConfig,
}

impl Default for VaultConfig {
    /// Configuration read from `VAULT_*` environment variables.
    fn default() -> Self {
        let mut config = Self::new(
            std::env::var("VAULT_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080/api/v1/".to_string()),
            std::env::var("VAULT_AUTH_URL")
                .unwrap_or_else(|_| "http://localhost:8080/token".to_string()),
            std::env::var("VAULT_CLIENT_ID").unwrap_or_default(),
            std::env::var("VAULT_CLIENT_SECRET").unwrap_or_default(),
        );
        config.encryption_enabled = std::env::var("VAULT_ENCRYPTION_ENABLED")
            .is_ok_and(|v| v.eq_ignore_ascii_case("true"));
        config.encryption_key = std::env::var("VAULT_ENCRYPTION_KEY").ok().map(SecretString::from);
        config
    }
}

impl VaultConfig {
    /// Create a configuration with built-in defaults.
    ///
    /// Unlike [`Default`], nothing is read from the environment; encryption
    /// stays off until [`Self::with_encryption_enabled`] is called.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        auth_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            auth_url: auth_url.into(),
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            max_retries: 3,
            initial_retry_delay: Duration::from_millis(1000),
            max_retry_delay: Duration::from_secs(30),
            token_expiry_buffer: Duration::from_secs(30),
            cache_enabled: true,
            encryption_enabled: false,
            encryption_key: None,
            max_batch_tokenize: MAX_BATCH_TOKENIZE,
            max_batch_detokenize: MAX_BATCH_DETOKENIZE,
            http: HttpConfig::default(),
        }
    }

    /// Set max retries.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base backoff delay.
    #[must_use]
    pub const fn with_initial_retry_delay(mut self, delay: Duration) -> Self {
        self.initial_retry_delay = delay;
        self
    }

    /// Enable or disable the cache.
    #[must_use]
    pub const fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Enable or disable encrypted transport.
    #[must_use]
    pub const fn with_encryption_enabled(mut self, enabled: bool) -> Self {
        self.encryption_enabled = enabled;
        self
    }

    /// Set the base64-encoded encryption key.
    #[must_use]
    pub fn with_encryption_key(mut self, key: impl Into<String>) -> Self {
        self.encryption_key = Some(SecretString::from(key.into()));
        self
    }

    /// Set the access token expiry buffer.
    #[must_use]
    pub const fn with_token_expiry_buffer(mut self, buffer: Duration) -> Self {
        self.token_expiry_buffer = buffer;
        self
    }

    /// Set transport settings.
    #[must_use]
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Backoff settings for the retry handler.
    #[must_use]
    pub const fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            initial_delay: self.initial_retry_delay,
            max_delay: self.max_retry_delay,
            multiplier: 2.0,
            jitter: false,
        }
    }

    /// Check the configuration before building a client.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for unparsable URLs, a missing client id or
    /// zero batch limits.
    pub fn validate(&self) -> VaultResult<()> {
        Url::parse(&self.base_url)
            .map_err(|e| VaultError::invalid_config(format!("base_url: {e}")))?;
        Url::parse(&self.auth_url)
            .map_err(|e| VaultError::invalid_config(format!("auth_url: {e}")))?;
        if self.client_id.trim().is_empty() {
            return Err(VaultError::invalid_config("client_id must not be empty"));
        }
        if self.max_batch_tokenize == 0 || self.max_batch_detokenize == 0 {
            return Err(VaultError::invalid_config("batch limits must be positive"));
        }
        Ok(())
    }
}

/// Resolved endpoint URLs.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Token endpoint
    pub auth: Url,
    /// Plain single tokenize
    pub tokenize: Url,
    /// Plain single detokenize
    pub detokenize: Url,
    /// Plain batch tokenize
    pub batch_tokenize: Url,
    /// Plain batch detokenize
    pub batch_detokenize: Url,
    /// Encrypted single tokenize
    pub encrypted_tokenize: Url,
    /// Encrypted single detokenize
    pub encrypted_detokenize: Url,
    /// Encrypted batch tokenize
    pub encrypted_batch_tokenize: Url,
    /// Encrypted batch detokenize
    pub encrypted_batch_detokenize: Url,
}

impl Endpoints {
    /// Resolve all endpoints from the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a URL cannot be parsed or joined.
    pub fn from_config(config: &VaultConfig) -> VaultResult<Self> {
        let base = Url::parse(&ensure_trailing_slash(&config.base_url))
            .map_err(|e| VaultError::invalid_config(format!("base_url: {e}")))?;
        let join = |path: &str| {
            base.join(path)
                .map_err(|e| VaultError::invalid_config(format!("{path}: {e}")))
        };

        Ok(Self {
            auth: Url::parse(&config.auth_url)
                .map_err(|e| VaultError::invalid_config(format!("auth_url: {e}")))?,
            tokenize: join("tokenize")?,
            detokenize: join("detokenize")?,
            batch_tokenize: join("batch/tokenize")?,
            batch_detokenize: join("batch/detokenize")?,
            encrypted_tokenize: join("encrypted/tokenize")?,
            encrypted_detokenize: join("encrypted/detokenize")?,
            encrypted_batch_tokenize: join("encrypted/batch/tokenize")?,
            encrypted_batch_detokenize: join("encrypted/batch/detokenize")?,
        })
    }
}

fn ensure_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}
