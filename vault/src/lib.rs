//! Vault tokenization client.
//!
//! Replaces sensitive values with tokens issued by the vault service and
//! resolves tokens back to values, singly or in bounded batches. Each call
//! goes through a shared pipeline that answers from a local cache when it
//! can, renews the access token transparently, retries transient failures
//! with backoff and encrypts payloads when enabled, falling back to plain
//! transport when the service cannot decrypt.
//!
//! ```no_run
//! use vault_tokenization::{TokenizationClient, VaultConfig};
//!
//! # async fn run() -> vault_tokenization::VaultResult<()> {
//! let config = VaultConfig::new(
//!     "https://vault.example.com/api/v1",
//!     "https://vault.example.com/token",
//!     "payments",
//!     "client-secret",
//! );
//! let client = TokenizationClient::new(config)?;
//! let token = client.tokenize("4111111111111111").await?.token;
//! let value = client.detokenize(token).await?.value;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod convert;
pub mod encryption;
pub mod error;
pub mod models;
pub mod operations;
pub mod pipeline;
pub mod retry;
pub mod transport;

pub use auth::{AuthTokenManager, Clock, SystemClock};
pub use cache::{CacheManager, TokenCache};
pub use client::{TokenizationClient, TokenizationClientBuilder};
pub use config::VaultConfig;
pub use convert::VaultValue;
pub use encryption::{AesGcmEncryptor, DisabledEncryptor, EncryptionStrategy, PayloadEncryptor};
pub use error::{VaultError, VaultResult};
pub use transport::{HttpTransport, RawResponse, VaultTransport};
