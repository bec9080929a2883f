//! The request pipeline shared by all tokenization operations.
//!
//! Every operation runs the same steps:
//!
//! 1. validate the request
//! 2. consult the cache, returning early on a complete hit
//! 3. call the vault for the uncached remainder (authenticated, retried,
//!    possibly encrypted)
//! 4. merge cached and fetched items, recomputing summaries
//! 5. write the fetched items back to the cache
//!
//! Operations plug in through the [`Operation`] trait.

use crate::{
    auth::AuthTokenManager,
    cache::CacheManager,
    encryption::{ApiResponse, EncryptionStrategy},
    error::{VaultError, VaultResult},
    retry::RetryHandler,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{Instrument, debug, error, info_span};
use uuid::Uuid;

/// Outcome of the cache lookup for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheCheckResult<Req, Res, Item = ()> {
    /// Everything was cached; no remote call is needed
    CompleteFromCache {
        /// Request as received
        request: Req,
        /// Result assembled from the cache
        result: Res,
    },
    /// Some items were cached; the rest must be fetched
    PartialFromCache {
        /// Request as received
        request: Req,
        /// Items answered by the cache, in discovery order
        cached_items: Vec<Item>,
        /// Request covering only the uncached remainder
        uncached: Req,
    },
    /// Nothing was cached
    NothingFromCache {
        /// Request as received
        request: Req,
        /// Request to send
        uncached: Req,
    },
}

impl<Req, Res, Item> CacheCheckResult<Req, Res, Item> {
    /// The request as received.
    pub const fn request(&self) -> &Req {
        match self {
            Self::CompleteFromCache { request, .. }
            | Self::PartialFromCache { request, .. }
            | Self::NothingFromCache { request, .. } => request,
        }
    }
}

/// Hooks a request kind plugs into [`OperationPipeline`].
#[async_trait]
pub trait Operation: Send + Sync {
    /// Request accepted by the operation
    type Request: Send + Sync;
    /// Result handed back to the caller
    type Output: Send;
    /// Per-item result answered by the cache (`()` for single operations)
    type Item: Send;
    /// Body returned by the vault
    type Remote: DeserializeOwned + Send;

    /// Operation name used in logs and error messages.
    const NAME: &'static str;

    /// Reject malformed requests before any I/O.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for requests that must not be sent.
    fn validate(&self, _request: &Self::Request) -> VaultResult<()> {
        Ok(())
    }

    /// Split the request into cached results and the remainder to fetch.
    fn check_cache(
        &self,
        cache: &CacheManager,
        request: Self::Request,
    ) -> CacheCheckResult<Self::Request, Self::Output, Self::Item>;

    /// Issue the remote call for `request`.
    async fn make_call(
        &self,
        strategy: &EncryptionStrategy,
        bearer: &str,
        request: &Self::Request,
    ) -> VaultResult<ApiResponse<Self::Remote>>;

    /// Merge cached items (first) with the fetched body (second).
    fn process_response(&self, remote: &Self::Remote, cached_items: Vec<Self::Item>) -> Self::Output;

    /// Write the freshly fetched portion back to the cache.
    fn update_cache(&self, cache: &CacheManager, request: &Self::Request, remote: &Self::Remote);
}

/// Runs [`Operation`]s against the shared auth, retry, transport and cache.
pub struct OperationPipeline {
    auth: Arc<AuthTokenManager>,
    retry: RetryHandler,
    strategy: EncryptionStrategy,
    cache: CacheManager,
}

impl OperationPipeline {
    /// Assemble a pipeline.
    #[must_use]
    pub const fn new(
        auth: Arc<AuthTokenManager>,
        retry: RetryHandler,
        strategy: EncryptionStrategy,
        cache: CacheManager,
    ) -> Self {
        Self { auth, retry, strategy, cache }
    }

    /// Cache policy in use.
    #[must_use]
    pub const fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Transport strategy in use.
    #[must_use]
    pub const fn strategy(&self) -> &EncryptionStrategy {
        &self.strategy
    }

    /// Token manager in use.
    #[must_use]
    pub const fn auth(&self) -> &Arc<AuthTokenManager> {
        &self.auth
    }

    /// Run `op` for `request`.
    ///
    /// # Errors
    ///
    /// Returns validation, authentication, transport, decryption and HTTP
    /// errors. The cache is only written after a fully successful call.
    pub async fn execute<O: Operation>(&self, op: &O, request: O::Request) -> VaultResult<O::Output> {
        let operation_id = Uuid::new_v4();
        let span = info_span!("vault_operation", operation = O::NAME, %operation_id);

        async move {
            let result = self.run(op, request).await;
            if let Err(e) = &result {
                error!(error = %e, "Operation failed");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run<O: Operation>(&self, op: &O, request: O::Request) -> VaultResult<O::Output> {
        op.validate(&request)?;

        let (cached_items, uncached) = match op.check_cache(&self.cache, request) {
            CacheCheckResult::CompleteFromCache { result, .. } => {
                debug!("Served entirely from cache");
                return Ok(result);
            }
            CacheCheckResult::PartialFromCache { cached_items, uncached, .. } => {
                debug!(cached = cached_items.len(), "Served partially from cache");
                (cached_items, uncached)
            }
            CacheCheckResult::NothingFromCache { uncached, .. } => (Vec::new(), uncached),
        };

        // Fail fast on bad credentials before entering the retry loop.
        self.auth.get_access_token().await?;

        let response = self
            .retry
            .execute_with_retry(|| self.attempt(op, &uncached))
            .await?;

        let remote = match response {
            ApiResponse::Success(body) => body,
            ApiResponse::Encrypted(encrypted) => self.strategy.decrypt_response(&encrypted)?,
            ApiResponse::Failed(raw) => {
                return Err(VaultError::Http {
                    operation: O::NAME,
                    status: raw.status,
                    body: raw.body,
                });
            }
        };

        let output = op.process_response(&remote, cached_items);
        op.update_cache(&self.cache, &uncached, &remote);
        Ok(output)
    }

    async fn attempt<O: Operation>(
        &self,
        op: &O,
        request: &O::Request,
    ) -> VaultResult<ApiResponse<O::Remote>> {
        let bearer = self.auth.get_access_token().await?;
        op.make_call(&self.strategy, &bearer, request).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Pipeline wired to scripted collaborators.

    use super::*;
    use crate::auth::{ClientCredentials, testing::ManualClock};
    use crate::cache::TokenCache;
    use crate::config::{Endpoints, VaultConfig};
    use crate::encryption::{EncryptedTransport, PayloadEncryptor, PlainTransport};
    use crate::retry::testing::RecordingSleeper;
    use crate::transport::{VaultTransport, testing::ScriptedTransport};
    use chrono::Utc;
    use rust_common::{RetryConfig, Sleeper};
    use secrecy::SecretString;
    use serde_json::json;
    use std::time::Duration;
    use url::Url;

    pub struct Harness {
        pub transport: Arc<ScriptedTransport>,
        pub sleeper: Arc<RecordingSleeper>,
        pub clock: Arc<ManualClock>,
        pub cache: Arc<TokenCache>,
        pub pipeline: OperationPipeline,
    }

    impl Harness {
        pub fn plain() -> Self {
            Self::build(None)
        }

        pub fn encrypted(encryptor: Arc<dyn PayloadEncryptor>) -> Self {
            Self::build(Some(encryptor))
        }

        fn build(encryptor: Option<Arc<dyn PayloadEncryptor>>) -> Self {
            let transport = Arc::new(ScriptedTransport::new());
            transport.ok("/token", 200, json!({"accessToken": "bearer-1", "expiresIn": 300}));
            let sleeper = Arc::new(RecordingSleeper::default());

            let (clock, cache, pipeline) = assemble(transport.clone(), sleeper.clone(), encryptor);
            Self { transport, sleeper, clock, cache, pipeline }
        }
    }

    /// Wire a plain or encrypted pipeline over `transport`, retrying at most twice.
    pub fn assemble(
        transport: Arc<dyn VaultTransport>,
        sleeper: Arc<dyn Sleeper>,
        encryptor: Option<Arc<dyn PayloadEncryptor>>,
    ) -> (Arc<ManualClock>, Arc<TokenCache>, OperationPipeline) {
        let config = VaultConfig::new("https://vault.test/api/v1", "https://vault.test/token", "c", "s");
        let endpoints = Arc::new(Endpoints::from_config(&config).unwrap());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let auth = Arc::new(AuthTokenManager::new(
            transport.clone(),
            Url::parse("https://vault.test/token").unwrap(),
            ClientCredentials {
                client_id: "c".to_string(),
                client_secret: SecretString::from("s".to_string()),
            },
            Duration::from_secs(30),
            clock.clone(),
        ));
        let retry = RetryHandler::new(RetryConfig::default().with_max_retries(2), auth.clone(), sleeper);
        let plain = PlainTransport::new(transport, endpoints);
        let strategy = match encryptor {
            Some(e) => EncryptionStrategy::Encrypted(EncryptedTransport::new(plain, e)),
            None => EncryptionStrategy::Plain(plain),
        };
        let cache = Arc::new(TokenCache::default());
        let pipeline = OperationPipeline::new(auth, retry, strategy, CacheManager::new(cache.clone()));

        (clock, cache, pipeline)
    }
}
