use std::time::{Duration, SystemTime};

use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Reads the server's `Retry-After` hint from response headers.
///
/// The value is read as whole seconds first and as an HTTP-date second, in
/// any of the IMF-fixdate, RFC 850 or asctime forms.
/// Returns `None` when the header is missing, unparseable, or names an
/// instant that has already passed; the caller then falls back to its own
/// exponential backoff.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    retry_after_at(headers, SystemTime::now())
}

pub(crate) fn retry_after_at(headers: &HeaderMap, now: SystemTime) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(seconds) = value.parse::<u64>() {
        return (seconds > 0).then(|| Duration::from_secs(seconds));
    }

    let at = httpdate::parse_http_date(value).ok()?;
    at.duration_since(now).ok().filter(|wait| !wait.is_zero())
}

/// Wait before retry number `attempt` (zero based).
///
/// A positive server hint wins over the exponential schedule; both are
/// capped at `max_wait`.
pub(crate) fn retry_delay(
    attempt: usize,
    base: Duration,
    max_wait: Duration,
    hint: Option<Duration>,
) -> Duration {
    if let Some(hint) = hint {
        return hint.min(max_wait);
    }
    let exp = attempt.min(16) as u32;
    base.saturating_mul(1u32 << exp).min(max_wait)
}
