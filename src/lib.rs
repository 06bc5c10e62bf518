//! `alerts-http` is a resilient async HTTP client for an alerts API.
//!
//! The client connects once, verifies reachability, and then submits alert
//! batches with automatic retry:
//! - [`AlertClient::connect`]
//! - [`AlertClient::send`]
//! - [`AlertClient::ping`]
//!
//! Retry decisions are made per attempt by a [`RetryPolicy`]; the default
//! ([`default_retry_policy`]) retries transient transport failures, 429 and
//! 5xx responses, and honors the server's `Retry-After` hint.

mod backoff;
mod client;
mod context;
mod dns;
mod error;
mod options;
mod report;
mod retry;
mod transport;
mod types;
mod wire;

pub use backoff::retry_after;
pub use client::{AlertClient, AlertSender};
pub use context::RequestContext;
pub use dns::NameResolutionError;
pub use error::{AlertClientError, OptionsError};
pub use options::{ClientOptions, TlsOptions};
pub use report::{error_message, sanitize_url};
pub use retry::{
    classify_transport_error, default_retry_policy, AttemptError, AttemptResponse, RetryPolicy,
    TransportFailure,
};
pub use types::{Alert, ResponseMetadata, Severity};

pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, AlertClientError>;
