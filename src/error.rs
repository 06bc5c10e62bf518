use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use crate::ResponseMetadata;

/// Error type returned by this crate.
///
/// The type is `Clone` so the single stored setup failure can be handed to
/// every caller of [`crate::AlertClient::connect`]; sources that are not
/// `Clone` themselves are shared through an [`Arc`].
#[derive(Clone, Debug, thiserror::Error)]
pub enum AlertClientError {
    /// The client was created with an empty base URL.
    #[error("base URL must be set")]
    MissingBaseUrl,
    /// The base URL could not be parsed.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    /// Options failed validation during setup.
    #[error("invalid options: {0}")]
    InvalidOptions(#[from] OptionsError),
    /// The HTTP transport could not be constructed.
    #[error("failed to build HTTP transport: {0}")]
    Build(Arc<reqwest::Error>),
    /// The health check issued during setup failed.
    #[error("failed to ping alerts API: {0}")]
    Ping(#[source] Box<AlertClientError>),
    /// The operation was invoked on an absent client handle.
    #[error("alert client is nil")]
    NilClient,
    /// The operation requires a successful [`crate::AlertClient::connect`].
    #[error("client not connected - call connect() first")]
    NotConnected,
    /// The client released its transport through [`crate::AlertClient::close`].
    #[error("client is closed")]
    Closed,
    #[error("alerts list cannot be empty")]
    EmptyAlerts,
    #[error("alert at index {index} is nil")]
    NilAlert { index: usize },
    /// An alert could not be serialized to JSON.
    #[error("failed to marshal alerts list: {0}")]
    Encode(Arc<serde_json::Error>),
    /// Network-level failure after retries were exhausted or ruled out.
    ///
    /// The message spells out the whole cause chain, down to the OS error.
    #[error("{method} {path} failed: {}", error_chain(.source))]
    Transport {
        method: reqwest::Method,
        path: String,
        source: Arc<reqwest::Error>,
    },
    /// A `connect` call was dropped while setup was running.
    ///
    /// Setup never runs twice, so the interruption is the stored outcome.
    #[error("setup was interrupted before it completed")]
    SetupInterrupted,
    /// The caller's cancellation token fired.
    #[error("{method} {path} failed: request canceled")]
    Canceled { method: reqwest::Method, path: String },
    /// The caller's deadline passed.
    #[error("{method} {path} failed: deadline exceeded")]
    DeadlineExceeded { method: reqwest::Method, path: String },
    /// The server answered with a non-success status.
    #[error("{method} {url} failed with status code {status}: {message}")]
    Http {
        method: reqwest::Method,
        /// Request URL with any user credentials redacted.
        url: String,
        status: u16,
        /// Message extracted from the response body.
        message: String,
        metadata: Box<ResponseMetadata>,
    },
}

impl AlertClientError {
    /// HTTP status code, if the server produced a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Ping(inner) => inner.status(),
            _ => None,
        }
    }

    /// Response metadata for failures that still received a response.
    pub fn response_metadata(&self) -> Option<&ResponseMetadata> {
        match self {
            Self::Http { metadata, .. } => Some(metadata.as_ref()),
            Self::Ping(inner) => inner.response_metadata(),
            _ => None,
        }
    }

    /// Whether the status carried by this error is one the default policy retries.
    pub fn is_retryable_status(&self) -> bool {
        self.status()
            .is_some_and(|status| status == 429 || status >= 500)
    }

    /// True for the cancellation and deadline variants.
    pub fn is_canceled(&self) -> bool {
        match self {
            Self::Canceled { .. } | Self::DeadlineExceeded { .. } | Self::SetupInterrupted => true,
            Self::Ping(inner) => inner.is_canceled(),
            _ => false,
        }
    }
}

/// Joins `err` and its sources with `": "`, skipping causes whose text
/// merely repeats the previous one.
pub(crate) fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut last = text.clone();
    let mut current = err.source();
    while let Some(cause) = current {
        let message = cause.to_string();
        if !message.is_empty() && !last.ends_with(&message) {
            text.push_str(": ");
            text.push_str(&message);
        }
        last = message;
        current = cause.source();
    }
    text
}

/// Validation failure for [`crate::ClientOptions`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("retry_count must not exceed {max}")]
    RetryCountTooLarge { max: usize },
    #[error("{field} must be at least {min:?}")]
    DurationTooShort { field: &'static str, min: Duration },
    #[error("{field} must not exceed {max:?}")]
    DurationTooLong { field: &'static str, max: Duration },
    #[error("retry_max_wait ({max_wait:?}) must be greater than or equal to retry_wait ({wait:?})")]
    MaxWaitBelowWait { wait: Duration, max_wait: Duration },
    #[error("cannot use both basic auth and token auth - choose one")]
    ConflictingAuth,
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be at least {min}")]
    CountTooSmall { field: &'static str, min: usize },
    #[error("{field} must not exceed {max}")]
    CountTooLarge { field: &'static str, max: usize },
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },
}
