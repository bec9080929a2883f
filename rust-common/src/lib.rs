//! Shared library for cross-cutting concerns of the vault tokenization client.
//!
//! This crate provides centralized implementations for:
//! - Transport error types with retryability classification
//! - HTTP status classification
//! - HTTP client configuration and building
//! - Exponential backoff schedules and an injectable sleep seam
//! - Tracing subscriber setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod retry;
pub mod tracing_config;

pub use error::{PlatformError, StatusClass};
pub use http::{HttpConfig, build_http_client};
pub use retry::{RetryConfig, RetryPolicy, Sleeper, TokioSleeper};
pub use tracing_config::{TracingConfig, init_tracing, try_init_tracing};
