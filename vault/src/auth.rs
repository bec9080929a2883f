//! Access token acquisition via the client-credentials exchange.

use crate::{
    error::{VaultError, VaultResult},
    models::AuthResponse,
    transport::VaultTransport,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::{sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use url::Url;

/// Source of "now" for token validity checks.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Bearer token with its lifetime.
#[derive(Debug, Clone)]
pub struct AccessToken {
    value: SecretString,
    obtained_at: DateTime<Utc>,
    expires_in_secs: i64,
}

impl AccessToken {
    /// Create a token obtained at `obtained_at`, valid for `expires_in_secs`.
    #[must_use]
    pub fn new(value: impl Into<String>, obtained_at: DateTime<Utc>, expires_in_secs: i64) -> Self {
        Self {
            value: SecretString::from(value.into()),
            obtained_at,
            expires_in_secs,
        }
    }

    /// The bearer value.
    #[must_use]
    pub fn secret(&self) -> &str {
        self.value.expose_secret()
    }

    /// When the token was obtained.
    #[must_use]
    pub const fn obtained_at(&self) -> DateTime<Utc> {
        self.obtained_at
    }

    /// `now < obtained_at + expires_in - buffer`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        let buffer_secs = i64::try_from(buffer.as_secs()).unwrap_or(i64::MAX);
        let usable_secs = self.expires_in_secs.saturating_sub(buffer_secs);
        ChronoDuration::try_seconds(usable_secs)
            .and_then(|usable| self.obtained_at.checked_add_signed(usable))
            .is_some_and(|deadline| now < deadline)
    }
}

/// Client credentials for the token exchange.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
}

/// Owns the cached access token and refreshes it on demand.
///
/// Retrying failed exchanges is the retry handler's job, not this type's.
pub struct AuthTokenManager {
    transport: Arc<dyn VaultTransport>,
    token_url: Url,
    credentials: ClientCredentials,
    buffer: Duration,
    clock: Arc<dyn Clock>,
    token: RwLock<Option<AccessToken>>,
}

impl AuthTokenManager {
    /// Create a manager with no cached token.
    #[must_use]
    pub fn new(
        transport: Arc<dyn VaultTransport>,
        token_url: Url,
        credentials: ClientCredentials,
        buffer: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            token_url,
            credentials,
            buffer,
            clock,
            token: RwLock::new(None),
        }
    }

    /// Return the cached token if still valid, otherwise exchange credentials.
    ///
    /// # Errors
    ///
    /// Propagates exchange failures from [`refresh_access_token`](Self::refresh_access_token).
    pub async fn get_access_token(&self) -> VaultResult<String> {
        {
            let guard = self.token.read().await;
            if let Some(token) = guard.as_ref() {
                if token.is_valid_at(self.clock.now(), self.buffer) {
                    return Ok(token.secret().to_string());
                }
            }
        }

        debug!("No valid access token cached");
        self.refresh_access_token().await
    }

    /// Unconditionally exchange credentials and replace the cached token.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` with status and body for a non-2xx
    /// response; transport failures propagate unchanged.
    #[instrument(skip(self), fields(client_id = %self.credentials.client_id))]
    pub async fn refresh_access_token(&self) -> VaultResult<String> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.expose_secret()),
        ];

        let response = self.transport.post_form(&self.token_url, &form).await?;
        if !response.is_success() {
            return Err(VaultError::AuthenticationFailed {
                status: response.status,
                body: response.body,
            });
        }

        let auth: AuthResponse = serde_json::from_str(&response.body)?;
        let token = AccessToken::new(auth.access_token, self.clock.now(), auth.expires_in);
        let value = token.secret().to_string();

        *self.token.write().await = Some(token);

        info!(expires_in = auth.expires_in, "Obtained access token");
        Ok(value)
    }

    /// Whether the cached token is valid right now. No side effects.
    pub async fn is_token_valid(&self) -> bool {
        self.token
            .read()
            .await
            .as_ref()
            .is_some_and(|t| t.is_valid_at(self.clock.now(), self.buffer))
    }
}
