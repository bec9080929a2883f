//! Plain and encrypted transport variants with the encryption fallback cascade.
//!
//! The encrypted variant degrades to the plain one when:
//!
//! 1. the encryptor reports itself disabled,
//! 2. encrypting this request fails (this call only),
//! 3. the encrypted endpoint answers 419 (for the rest of the instance's life).
//!
//! Any other failure from the encrypted endpoint is returned unchanged.

use super::encryptor::PayloadEncryptor;
use crate::{
    config::Endpoints,
    error::{VaultError, VaultResult},
    models::{
        BatchDetokenizeRequest, BatchDetokenizeResponse, BatchTokenizeRequest,
        BatchTokenizeResponse, DetokenizeRequest, DetokenizeResponse, EncryptedResponse,
        TokenizeRequest, TokenizeResponse,
    },
    retry::RetryableResponse,
    transport::{RawResponse, VaultTransport},
};
use rust_common::PlatformError;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tracing::{debug, info, warn};
use url::Url;

/// Server cannot decrypt encrypted payloads.
pub const BACKEND_DECRYPTION_UNAVAILABLE: u16 = 419;

/// The remote operation a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCall {
    /// Single tokenize
    Tokenize,
    /// Single detokenize
    Detokenize,
    /// Batch tokenize
    BatchTokenize,
    /// Batch detokenize
    BatchDetokenize,
}

impl RemoteCall {
    fn plain_url(self, endpoints: &Endpoints) -> &Url {
        match self {
            Self::Tokenize => &endpoints.tokenize,
            Self::Detokenize => &endpoints.detokenize,
            Self::BatchTokenize => &endpoints.batch_tokenize,
            Self::BatchDetokenize => &endpoints.batch_detokenize,
        }
    }

    fn encrypted_url(self, endpoints: &Endpoints) -> &Url {
        match self {
            Self::Tokenize => &endpoints.encrypted_tokenize,
            Self::Detokenize => &endpoints.encrypted_detokenize,
            Self::BatchTokenize => &endpoints.encrypted_batch_tokenize,
            Self::BatchDetokenize => &endpoints.encrypted_batch_detokenize,
        }
    }
}

/// Remote response, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    /// 2xx with a typed body
    Success(T),
    /// 2xx with an opaque encrypted body
    Encrypted(EncryptedResponse),
    /// Non-2xx status
    Failed(RawResponse),
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Classify a raw response.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if a 2xx body is neither an encrypted
    /// envelope nor a `T`.
    pub fn from_raw(raw: RawResponse) -> VaultResult<Self> {
        if !raw.is_success() {
            return Ok(Self::Failed(raw));
        }

        let body: Value = serde_json::from_str(&raw.body)?;
        if let Ok(encrypted) = EncryptedResponse::deserialize(&body) {
            return Ok(Self::Encrypted(encrypted));
        }
        Ok(Self::Success(serde_json::from_value(body)?))
    }
}

impl<T> RetryableResponse for ApiResponse<T> {
    fn status(&self) -> u16 {
        match self {
            Self::Success(_) | Self::Encrypted(_) => 200,
            Self::Failed(raw) => raw.status,
        }
    }
}

/// Calls the unencrypted endpoints.
#[derive(Clone)]
pub struct PlainTransport {
    transport: Arc<dyn VaultTransport>,
    endpoints: Arc<Endpoints>,
}

impl PlainTransport {
    /// Create a plain transport.
    #[must_use]
    pub fn new(transport: Arc<dyn VaultTransport>, endpoints: Arc<Endpoints>) -> Self {
        Self { transport, endpoints }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        call: RemoteCall,
        bearer: &str,
        body: &Value,
    ) -> VaultResult<ApiResponse<T>> {
        let raw = self
            .transport
            .post_json(call.plain_url(&self.endpoints), bearer, body)
            .await?;
        ApiResponse::from_raw(raw)
    }
}

/// Calls the encrypted endpoints, degrading to [`PlainTransport`].
pub struct EncryptedTransport {
    plain: PlainTransport,
    encryptor: Arc<dyn PayloadEncryptor>,
    plain_only: AtomicBool,
}

impl EncryptedTransport {
    /// Create an encrypted transport.
    #[must_use]
    pub fn new(plain: PlainTransport, encryptor: Arc<dyn PayloadEncryptor>) -> Self {
        Self { plain, encryptor, plain_only: AtomicBool::new(false) }
    }

    fn is_active(&self) -> bool {
        self.encryptor.is_enabled() && !self.plain_only.load(Ordering::Acquire)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        call: RemoteCall,
        bearer: &str,
        body: &Value,
    ) -> VaultResult<ApiResponse<T>> {
        if !self.is_active() {
            return self.plain.send(call, bearer, body).await;
        }

        let envelope = match serde_json::to_vec(body)
            .map_err(VaultError::from)
            .and_then(|bytes| self.encryptor.encrypt(&bytes))
        {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, ?call, "Request encryption failed, sending unencrypted");
                return self.plain.send(call, bearer, body).await;
            }
        };

        let url = call.encrypted_url(&self.plain.endpoints);
        let outcome = self
            .plain
            .transport
            .post_json(url, bearer, &serde_json::to_value(&envelope)?)
            .await;

        match outcome {
            Ok(raw) if raw.status == BACKEND_DECRYPTION_UNAVAILABLE => {
                self.fall_back_permanently(call);
                self.plain.send(call, bearer, body).await
            }
            Err(e) if is_backend_decryption_unavailable(&e) => {
                self.fall_back_permanently(call);
                self.plain.send(call, bearer, body).await
            }
            Ok(raw) => {
                debug!(status = raw.status, ?call, "Encrypted call completed");
                ApiResponse::from_raw(raw)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn fall_back_permanently(&self, call: RemoteCall) {
        if !self.plain_only.swap(true, Ordering::AcqRel) {
            info!(?call, "Vault cannot decrypt payloads, disabling encryption for this client");
        }
    }

    fn try_decrypt<T: DeserializeOwned>(&self, response: &EncryptedResponse) -> Option<T> {
        let bytes = self
            .encryptor
            .decrypt(response)
            .inspect_err(|e| warn!(error = %e, "Response decryption failed"))
            .ok()?;
        serde_json::from_slice(&bytes)
            .inspect_err(|e| warn!(error = %e, "Decrypted response is not valid JSON"))
            .ok()
    }
}

fn is_backend_decryption_unavailable(err: &PlatformError) -> bool {
    err.status() == Some(BACKEND_DECRYPTION_UNAVAILABLE)
}

/// Transport variant selected for a client.
pub enum EncryptionStrategy {
    /// Unencrypted endpoints only
    Plain(PlainTransport),
    /// Encrypted endpoints with fallback
    Encrypted(EncryptedTransport),
}

impl EncryptionStrategy {
    /// Whether the next call would attempt encryption.
    #[must_use]
    pub fn is_encryption_active(&self) -> bool {
        match self {
            Self::Plain(_) => false,
            Self::Encrypted(t) => t.is_active(),
        }
    }

    /// Send `body` to the endpoint for `call`.
    ///
    /// # Errors
    ///
    /// Returns transport failures and malformed 2xx bodies. Non-2xx responses
    /// are returned as [`ApiResponse::Failed`].
    pub async fn send<B, T>(&self, call: RemoteCall, bearer: &str, body: &B) -> VaultResult<ApiResponse<T>>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        match self {
            Self::Plain(t) => t.send(call, bearer, &body).await,
            Self::Encrypted(t) => t.send(call, bearer, &body).await,
        }
    }

    /// Single tokenize.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn tokenize(
        &self,
        bearer: &str,
        request: &TokenizeRequest,
    ) -> VaultResult<ApiResponse<TokenizeResponse>> {
        self.send(RemoteCall::Tokenize, bearer, request).await
    }

    /// Single detokenize.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn detokenize(
        &self,
        bearer: &str,
        request: &DetokenizeRequest,
    ) -> VaultResult<ApiResponse<DetokenizeResponse>> {
        self.send(RemoteCall::Detokenize, bearer, request).await
    }

    /// Batch tokenize.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn batch_tokenize(
        &self,
        bearer: &str,
        request: &BatchTokenizeRequest,
    ) -> VaultResult<ApiResponse<BatchTokenizeResponse>> {
        self.send(RemoteCall::BatchTokenize, bearer, request).await
    }

    /// Batch detokenize.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn batch_detokenize(
        &self,
        bearer: &str,
        request: &BatchDetokenizeRequest,
    ) -> VaultResult<ApiResponse<BatchDetokenizeResponse>> {
        self.send(RemoteCall::BatchDetokenize, bearer, request).await
    }

    /// Turn an encrypted response body back into its typed form.
    ///
    /// # Errors
    ///
    /// Returns `StrategyMismatch` on the plain variant and `DecryptionFailed`
    /// if the body cannot be decrypted or parsed.
    pub fn decrypt_response<T: DeserializeOwned>(&self, response: &EncryptedResponse) -> VaultResult<T> {
        match self {
            Self::Plain(_) => Err(VaultError::StrategyMismatch),
            Self::Encrypted(t) => t.try_decrypt(response).ok_or(VaultError::DecryptionFailed),
        }
    }
}
