//! Tokenization client with caching, token renewal, retries and encrypted transport.

use crate::{
    auth::{AuthTokenManager, ClientCredentials, Clock, SystemClock},
    cache::{CacheManager, TokenCache},
    config::{Endpoints, VaultConfig},
    convert::VaultValue,
    encryption::{AesGcmEncryptor, EncryptedTransport, EncryptionStrategy, PayloadEncryptor, PlainTransport},
    error::{VaultError, VaultResult},
    models::{
        BatchDetokenizeRequest, BatchDetokenizeResponse, BatchTokenizeRequest,
        BatchTokenizeResponse, DetokenizeRequest, DetokenizeResponse, TokenizeRequest,
        TokenizeResponse,
    },
    operations::{BatchDetokenizeOperation, BatchTokenizeOperation, DetokenizeOperation, TokenizeOperation},
    pipeline::OperationPipeline,
    retry::RetryHandler,
    transport::{HttpTransport, VaultTransport},
};
use rust_common::{Sleeper, TokioSleeper};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::info;

/// Client for the vault tokenization service.
pub struct TokenizationClient {
    pipeline: OperationPipeline,
    cache: Arc<TokenCache>,
    batch_tokenize: BatchTokenizeOperation,
    batch_detokenize: BatchDetokenizeOperation,
}

impl TokenizationClient {
    /// Create a client using the default HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a bad configuration or if the HTTP client
    /// cannot be built.
    pub fn new(config: VaultConfig) -> VaultResult<Self> {
        Self::builder(config).build()
    }

    /// Start building a client with custom collaborators.
    #[must_use]
    pub fn builder(config: VaultConfig) -> TokenizationClientBuilder {
        TokenizationClientBuilder::new(config)
    }

    /// Tokenize one value.
    ///
    /// # Errors
    ///
    /// Returns authentication, transport and HTTP errors.
    pub async fn tokenize(&self, value: impl Into<String>) -> VaultResult<TokenizeResponse> {
        let request = TokenizeRequest { value: value.into() };
        self.pipeline.execute(&TokenizeOperation, request).await
    }

    /// Tokenize a typed value using its vault string form.
    ///
    /// # Errors
    ///
    /// See [`tokenize`](Self::tokenize).
    pub async fn tokenize_value<T: VaultValue>(&self, value: &T) -> VaultResult<TokenizeResponse> {
        self.tokenize(value.to_vault_string()).await
    }

    /// Resolve one token.
    ///
    /// # Errors
    ///
    /// Returns authentication, transport and HTTP errors.
    pub async fn detokenize(&self, token: impl Into<String>) -> VaultResult<DetokenizeResponse> {
        let request = DetokenizeRequest { token: token.into() };
        self.pipeline.execute(&DetokenizeOperation, request).await
    }

    /// Resolve one token and parse the value as `T`. `None` if the token is unknown.
    ///
    /// # Errors
    ///
    /// Returns `Conversion` if the value does not parse, otherwise see
    /// [`detokenize`](Self::detokenize).
    pub async fn detokenize_as<T: VaultValue>(&self, token: impl Into<String>) -> VaultResult<Option<T>> {
        self.detokenize(token)
            .await?
            .value
            .as_deref()
            .map(T::from_vault_string)
            .transpose()
    }

    /// Tokenize a batch of values.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty or oversized batch, otherwise
    /// authentication, transport and HTTP errors.
    pub async fn batch_tokenize(&self, values: Vec<String>) -> VaultResult<BatchTokenizeResponse> {
        let request = BatchTokenizeRequest { values };
        self.pipeline.execute(&self.batch_tokenize, request).await
    }

    /// Resolve a batch of tokens.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty or oversized batch, otherwise
    /// authentication, transport and HTTP errors.
    pub async fn batch_detokenize(&self, tokens: Vec<String>) -> VaultResult<BatchDetokenizeResponse> {
        let request = BatchDetokenizeRequest { tokens };
        self.pipeline.execute(&self.batch_detokenize, request).await
    }

    /// Drop every cached pair.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Turn the cache on or off.
    pub fn set_cache_enabled(&self, enabled: bool) {
        self.cache.set_enabled(enabled);
    }

    /// Whether the cache is on.
    #[must_use]
    pub fn is_cache_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    /// Number of cached pairs.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the next call would go through the encrypted endpoints.
    #[must_use]
    pub fn is_encryption_active(&self) -> bool {
        self.pipeline.strategy().is_encryption_active()
    }

    /// Whether a usable access token is cached.
    pub async fn is_token_valid(&self) -> bool {
        self.pipeline.auth().is_token_valid().await
    }
}

/// Builder for [`TokenizationClient`].
pub struct TokenizationClientBuilder {
    config: VaultConfig,
    transport: Option<Arc<dyn VaultTransport>>,
    clock: Option<Arc<dyn Clock>>,
    sleeper: Option<Arc<dyn Sleeper>>,
    encryptor: Option<Arc<dyn PayloadEncryptor>>,
}

impl TokenizationClientBuilder {
    /// Start from a configuration.
    #[must_use]
    pub fn new(config: VaultConfig) -> Self {
        Self { config, transport: None, clock: None, sleeper: None, encryptor: None }
    }

    /// Use a custom transport instead of reqwest.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn VaultTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom clock for token expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use a custom sleeper for retry backoff.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Use a custom encryptor. Only consulted when encryption is enabled.
    #[must_use]
    pub fn with_encryptor(mut self, encryptor: Arc<dyn PayloadEncryptor>) -> Self {
        self.encryptor = Some(encryptor);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a bad configuration, or when encryption
    /// is enabled with neither an encryptor nor a key.
    pub fn build(self) -> VaultResult<TokenizationClient> {
        let config = self.config;
        config.validate()?;

        let endpoints = Arc::new(Endpoints::from_config(&config)?);
        let transport: Arc<dyn VaultTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(&config.http)?),
        };

        let auth = Arc::new(AuthTokenManager::new(
            Arc::clone(&transport),
            endpoints.auth.clone(),
            ClientCredentials {
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
            },
            config.token_expiry_buffer,
            self.clock.unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>),
        ));

        let retry = RetryHandler::new(
            config.retry_config(),
            Arc::clone(&auth),
            self.sleeper.unwrap_or_else(|| Arc::new(TokioSleeper) as Arc<dyn Sleeper>),
        );

        let plain = PlainTransport::new(transport, endpoints);
        let strategy = if config.encryption_enabled {
            let encryptor: Arc<dyn PayloadEncryptor> = match (self.encryptor, config.encryption_key.as_ref()) {
                (Some(e), _) => e,
                (None, Some(key)) => Arc::new(AesGcmEncryptor::from_base64_key(key.expose_secret())?),
                (None, None) => {
                    return Err(VaultError::invalid_config(
                        "encryption is enabled but no encryption key is configured",
                    ));
                }
            };
            EncryptionStrategy::Encrypted(EncryptedTransport::new(plain, encryptor))
        } else {
            EncryptionStrategy::Plain(plain)
        };

        let cache = Arc::new(TokenCache::new(config.cache_enabled));
        let pipeline = OperationPipeline::new(auth, retry, strategy, CacheManager::new(Arc::clone(&cache)));

        info!(
            base_url = %config.base_url,
            cache_enabled = config.cache_enabled,
            encryption_enabled = config.encryption_enabled,
            max_retries = config.max_retries,
            "Tokenization client created"
        );

        Ok(TokenizationClient {
            pipeline,
            cache,
            batch_tokenize: BatchTokenizeOperation::new(config.max_batch_tokenize),
            batch_detokenize: BatchDetokenizeOperation::new(config.max_batch_detokenize),
        })
    }
}
