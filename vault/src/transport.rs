//! HTTP boundary of the client.
//!
//! A transport returns every HTTP response, whatever its status, as a
//! [`RawResponse`]. Only failures that produced no response at all surface as
//! `Err`, so status handling stays with the retry and pipeline layers.

use async_trait::async_trait;
use reqwest::Client;
use rust_common::{HttpConfig, PlatformError, build_http_client};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl RawResponse {
    /// Create a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Minimal HTTP surface the client needs.
#[async_trait]
pub trait VaultTransport: Send + Sync {
    /// POST an url-encoded form, unauthenticated.
    async fn post_form(
        &self,
        url: &Url,
        form: &[(&str, &str)],
    ) -> Result<RawResponse, PlatformError>;

    /// POST a JSON body with `Authorization: Bearer <bearer>`.
    async fn post_json(
        &self,
        url: &Url,
        bearer: &str,
        body: &Value,
    ) -> Result<RawResponse, PlatformError>;
}

/// [`VaultTransport`] backed by a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Build a transport from HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built.
    pub fn new(config: &HttpConfig) -> Result<Self, PlatformError> {
        Ok(Self { http: build_http_client(config)? })
    }

    /// Wrap an existing reqwest client.
    #[must_use]
    pub const fn from_client(http: Client) -> Self {
        Self { http }
    }

    async fn into_raw(response: reqwest::Response) -> Result<RawResponse, PlatformError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, "Received response");
        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl VaultTransport for HttpTransport {
    #[instrument(skip(self, form), fields(url = %url))]
    async fn post_form(
        &self,
        url: &Url,
        form: &[(&str, &str)],
    ) -> Result<RawResponse, PlatformError> {
        let response = self.http.post(url.clone()).form(form).send().await?;
        Self::into_raw(response).await
    }

    #[instrument(skip(self, bearer, body), fields(url = %url))]
    async fn post_json(
        &self,
        url: &Url,
        bearer: &str,
        body: &Value,
    ) -> Result<RawResponse, PlatformError> {
        let response = self
            .http
            .post(url.clone())
            .bearer_auth(bearer)
            .json(body)
            .send()
            .await?;
        Self::into_raw(response).await
    }
}
