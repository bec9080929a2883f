//! Bounded retries around a single remote call.
//!
//! - 401: refresh the access token and retry at once, without backoff.
//! - 429, 5xx or a transient transport failure: back off exponentially.
//! - Anything else: return immediately.
//!
//! Every retry, whatever its cause, consumes one unit of `max_retries`.

use crate::{
    auth::AuthTokenManager,
    error::{VaultError, VaultResult},
    transport::RawResponse,
};
use rust_common::{RetryConfig, RetryPolicy, Sleeper, StatusClass};
use std::{future::Future, sync::Arc};
use tracing::{debug, warn};

/// Anything that carries an HTTP status the retry handler can classify.
pub trait RetryableResponse {
    /// HTTP status of the response.
    fn status(&self) -> u16;
}

impl RetryableResponse for RawResponse {
    fn status(&self) -> u16 {
        self.status
    }
}

enum NextStep {
    Done,
    Refresh,
    Backoff,
}

fn classify<R: RetryableResponse>(outcome: &VaultResult<R>) -> NextStep {
    let status = match outcome {
        Ok(response) => Some(response.status()),
        Err(VaultError::Http { status, .. }) => Some(*status),
        Err(VaultError::Platform(e)) => e.status(),
        Err(_) => None,
    };

    match status.map(StatusClass::from_status) {
        Some(StatusClass::Unauthorized) => NextStep::Refresh,
        Some(StatusClass::Transient) => NextStep::Backoff,
        Some(StatusClass::Success | StatusClass::Permanent) => NextStep::Done,
        None => match outcome {
            Err(e) if e.is_retryable() => NextStep::Backoff,
            _ => NextStep::Done,
        },
    }
}

/// Executes remote calls with token refresh and exponential backoff.
pub struct RetryHandler {
    policy: RetryPolicy,
    auth: Arc<AuthTokenManager>,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryHandler {
    /// Create a retry handler.
    #[must_use]
    pub fn new(config: RetryConfig, auth: Arc<AuthTokenManager>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            policy: RetryPolicy::new(config),
            auth,
            sleeper,
        }
    }

    /// Run `call` until it yields a final outcome or the retry budget is spent.
    ///
    /// `call` must read the current access token on every invocation so a
    /// refreshed token is picked up by the next attempt.
    ///
    /// # Errors
    ///
    /// Returns the last transport error once retries are exhausted, any
    /// non-retryable error immediately, and token refresh failures as-is.
    pub async fn execute_with_retry<F, Fut, R>(&self, mut call: F) -> VaultResult<R>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = VaultResult<R>>,
        R: RetryableResponse,
    {
        let mut retries = 0;
        loop {
            let outcome = call().await;
            let step = classify(&outcome);

            if let NextStep::Done = step {
                return outcome;
            }
            if !self.policy.has_retries_left(retries) {
                warn!(retries, "Retries exhausted");
                return outcome;
            }
            retries += 1;

            if let NextStep::Refresh = step {
                warn!(attempt = retries, "Access token rejected, refreshing");
                self.auth.refresh_access_token().await?;
            } else {
                let delay = self.policy.delay_for_attempt(retries);
                warn!(
                    attempt = retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Transient failure, backing off"
                );
                self.sleeper.sleep(delay).await;
            }
            debug!(attempt = retries, "Retrying remote call");
        }
    }
}
