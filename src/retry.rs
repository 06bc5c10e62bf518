//! Retry classification for individual request attempts.
//!
//! Every attempt ends either in a completed [`AttemptResponse`] or an
//! [`AttemptError`]. A [`RetryPolicy`] maps that outcome to a retry decision;
//! [`default_retry_policy`] is the policy installed unless the caller
//! overrides it through [`crate::ClientOptions::with_retry_policy`].

use std::error::Error as StdError;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{header::HeaderMap, StatusCode};

use crate::dns::NameResolutionError;

/// Decides whether an attempt outcome should be retried.
pub type RetryPolicy =
    Arc<dyn Fn(Result<&AttemptResponse, &AttemptError>) -> bool + Send + Sync>;

/// Completed response of a single attempt, body fully read.
#[derive(Clone, Debug)]
pub struct AttemptResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    /// Time from sending the request to the end of the body.
    pub elapsed: Duration,
}

/// Failure of a single attempt before a response was received.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    /// The caller's cancellation token fired.
    #[error("request canceled")]
    Canceled,
    /// The caller's deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Structured category of a transport-level failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportFailure {
    /// The host name could not be resolved.
    NameResolution,
    /// The peer or the network deterministically rejected the connection.
    ConnectionRejected,
    /// Anything else: timeouts, resets, aborted bodies.
    Transient,
}

/// The default retry decision table.
///
/// Transport failures are retried unless they stem from the caller's own
/// cancellation or deadline, a name-resolution failure, or a permanent
/// connection rejection. Completed responses are retried on 429 and 5xx.
pub fn default_retry_policy(outcome: Result<&AttemptResponse, &AttemptError>) -> bool {
    match outcome {
        Err(AttemptError::Canceled | AttemptError::DeadlineExceeded) => false,
        Err(AttemptError::Transport(err)) => {
            classify_transport_error(err) == TransportFailure::Transient
        }
        Ok(response) => should_retry_status(response.status),
    }
}

pub(crate) fn should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Walks the source chain of `err` looking for a structured cause.
pub fn classify_transport_error(err: &(dyn StdError + 'static)) -> TransportFailure {
    let mut current = Some(err);
    while let Some(cause) = current {
        if cause.is::<NameResolutionError>() {
            return TransportFailure::NameResolution;
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if is_permanent_io_kind(io_err.kind()) {
                return TransportFailure::ConnectionRejected;
            }
        }
        current = cause.source();
    }
    TransportFailure::Transient
}

fn is_permanent_io_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::NetworkUnreachable
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::PermissionDenied
    )
}
