use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};

use crate::{default_retry_policy, OptionsError, RetryPolicy};

pub(crate) const MAX_RETRY_COUNT: usize = 100;
pub(crate) const MIN_RETRY_WAIT: Duration = Duration::from_millis(100);
pub(crate) const MAX_RETRY_WAIT: Duration = Duration::from_secs(60);
pub(crate) const MIN_RETRY_MAX_WAIT: Duration = Duration::from_millis(100);
pub(crate) const MAX_RETRY_MAX_WAIT: Duration = Duration::from_secs(5 * 60);
pub(crate) const MIN_TIMEOUT: Duration = Duration::from_secs(1);
pub(crate) const MAX_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub(crate) const MAX_CONNS_PER_HOST: usize = 100;
pub(crate) const MIN_IDLE_CONN_TIMEOUT: Duration = Duration::from_secs(1);
pub(crate) const MAX_IDLE_CONN_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub(crate) const MAX_REDIRECTS: usize = 20;

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("alerts-http/", env!("CARGO_PKG_VERSION"));

const PROTECTED_HEADERS: [&str; 2] = ["Content-Type", "Accept"];

/// Configures retry, timeout, pooling, authentication and endpoint behavior.
///
/// Setters silently ignore values outside their accepted range and keep the
/// previous value. Remaining cross-field constraints are checked by
/// [`ClientOptions::validate`], which runs once during
/// [`crate::AlertClient::connect`].
#[derive(Clone)]
pub struct ClientOptions {
    /// Maximum number of retries after the initial attempt.
    pub retry_count: usize,
    /// Initial wait between retries (doubled per attempt).
    pub retry_wait: Duration,
    /// Upper bound for any single wait between retries.
    pub retry_max_wait: Duration,
    pub retry_policy: RetryPolicy,
    /// Extra headers sent with every request.
    pub headers: BTreeMap<String, String>,
    pub basic_auth: Option<(String, String)>,
    pub auth_scheme: String,
    pub auth_token: Option<String>,
    /// Overall timeout for a single attempt.
    pub timeout: Duration,
    pub user_agent: String,
    pub max_idle_conns: usize,
    pub max_conns_per_host: usize,
    pub idle_conn_timeout: Duration,
    pub disable_keep_alive: bool,
    pub max_redirects: usize,
    pub tls: TlsOptions,
    pub alerts_endpoint: String,
    pub ping_endpoint: String,
}

/// TLS settings applied to the transport.
#[derive(Clone, Debug, Default)]
pub struct TlsOptions {
    /// Additional trusted root certificates.
    pub root_certificates: Vec<reqwest::Certificate>,
    pub min_version: Option<reqwest::tls::Version>,
    /// Disables certificate verification. Only meant for tests.
    pub accept_invalid_certs: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            retry_count: 3,
            retry_wait: Duration::from_millis(500),
            retry_max_wait: Duration::from_secs(3),
            retry_policy: Arc::new(default_retry_policy),
            headers: BTreeMap::new(),
            basic_auth: None,
            auth_scheme: "Bearer".to_owned(),
            auth_token: None,
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            max_idle_conns: 100,
            max_conns_per_host: 10,
            idle_conn_timeout: Duration::from_secs(90),
            disable_keep_alive: false,
            max_redirects: 10,
            tls: TlsOptions::default(),
            alerts_endpoint: "alerts".to_owned(),
            ping_endpoint: "ping".to_owned(),
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("retry_count", &self.retry_count)
            .field("retry_wait", &self.retry_wait)
            .field("retry_max_wait", &self.retry_max_wait)
            .field("headers", &self.headers)
            .field(
                "basic_auth",
                &self.basic_auth.as_ref().map(|(user, _)| (user, "<redacted>")),
            )
            .field("auth_scheme", &self.auth_scheme)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("max_idle_conns", &self.max_idle_conns)
            .field("max_conns_per_host", &self.max_conns_per_host)
            .field("idle_conn_timeout", &self.idle_conn_timeout)
            .field("disable_keep_alive", &self.disable_keep_alive)
            .field("max_redirects", &self.max_redirects)
            .field("tls", &self.tls)
            .field("alerts_endpoint", &self.alerts_endpoint)
            .field("ping_endpoint", &self.ping_endpoint)
            .finish_non_exhaustive()
    }
}

impl ClientOptions {
    /// Sets the number of retries. Values above 100 are rejected by `validate`.
    pub fn with_retry_count(mut self, count: usize) -> Self {
        self.retry_count = count;
        self
    }

    /// Sets the initial retry wait. Values below 100ms are ignored.
    pub fn with_retry_wait(mut self, wait: Duration) -> Self {
        if wait >= MIN_RETRY_WAIT {
            self.retry_wait = wait;
        }
        self
    }

    /// Sets the maximum retry wait. Values below 100ms are ignored.
    pub fn with_retry_max_wait(mut self, max_wait: Duration) -> Self {
        if max_wait >= MIN_RETRY_MAX_WAIT {
            self.retry_max_wait = max_wait;
        }
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Adds a header sent with every request.
    ///
    /// Name and value are trimmed. Empty names and the protected
    /// `Content-Type`/`Accept` headers are ignored.
    pub fn with_request_header(mut self, name: &str, value: &str) -> Self {
        let name = name.trim();
        let value = value.trim();
        let protected = PROTECTED_HEADERS
            .iter()
            .any(|header| header.eq_ignore_ascii_case(name));
        if !name.is_empty() && !protected {
            self.headers.insert(name.to_owned(), value.to_owned());
        }
        self
    }

    /// Configures HTTP basic authentication. Conflicts with [`Self::with_auth_token`].
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let username = username.into();
        self.basic_auth = (!username.is_empty()).then(|| (username, password.into()));
        self
    }

    /// Sets the scheme word used with [`Self::with_auth_token`]. Defaults to `Bearer`.
    pub fn with_auth_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.auth_scheme = scheme.into();
        self
    }

    /// Configures token authentication. Conflicts with [`Self::with_basic_auth`].
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth_token = (!token.is_empty()).then_some(token);
        self
    }

    /// Sets the per-attempt timeout. Values outside 1s..=5min are ignored.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if (MIN_TIMEOUT..=MAX_TIMEOUT).contains(&timeout) {
            self.timeout = timeout;
        }
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        let user_agent = user_agent.into();
        if !user_agent.is_empty() {
            self.user_agent = user_agent;
        }
        self
    }

    pub fn with_max_idle_conns(mut self, n: usize) -> Self {
        if n >= 1 {
            self.max_idle_conns = n;
        }
        self
    }

    pub fn with_max_conns_per_host(mut self, n: usize) -> Self {
        if (1..=MAX_CONNS_PER_HOST).contains(&n) {
            self.max_conns_per_host = n;
        }
        self
    }

    pub fn with_idle_conn_timeout(mut self, timeout: Duration) -> Self {
        if (MIN_IDLE_CONN_TIMEOUT..=MAX_IDLE_CONN_TIMEOUT).contains(&timeout) {
            self.idle_conn_timeout = timeout;
        }
        self
    }

    /// When set, every request opens a fresh connection.
    pub fn with_disable_keep_alive(mut self, disable: bool) -> Self {
        self.disable_keep_alive = disable;
        self
    }

    /// Sets the redirect cap; `0` disables redirects. Values above 20 are ignored.
    pub fn with_max_redirects(mut self, n: usize) -> Self {
        if n <= MAX_REDIRECTS {
            self.max_redirects = n;
        }
        self
    }

    pub fn with_tls(mut self, tls: TlsOptions) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_alerts_endpoint(mut self, endpoint: &str) -> Self {
        let endpoint = endpoint.trim();
        if !endpoint.is_empty() {
            self.alerts_endpoint = endpoint.to_owned();
        }
        self
    }

    pub fn with_ping_endpoint(mut self, endpoint: &str) -> Self {
        let endpoint = endpoint.trim();
        if !endpoint.is_empty() {
            self.ping_endpoint = endpoint.to_owned();
        }
        self
    }

    /// Checks every field and cross-field constraint.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.retry_count > MAX_RETRY_COUNT {
            return Err(OptionsError::RetryCountTooLarge {
                max: MAX_RETRY_COUNT,
            });
        }
        check_duration("retry_wait", self.retry_wait, MIN_RETRY_WAIT, MAX_RETRY_WAIT)?;
        check_duration(
            "retry_max_wait",
            self.retry_max_wait,
            MIN_RETRY_MAX_WAIT,
            MAX_RETRY_MAX_WAIT,
        )?;
        if self.retry_max_wait < self.retry_wait {
            return Err(OptionsError::MaxWaitBelowWait {
                wait: self.retry_wait,
                max_wait: self.retry_max_wait,
            });
        }
        if self.basic_auth.is_some() && self.auth_token.is_some() {
            return Err(OptionsError::ConflictingAuth);
        }
        check_duration("timeout", self.timeout, MIN_TIMEOUT, MAX_TIMEOUT)?;
        if self.user_agent.is_empty() {
            return Err(OptionsError::Empty {
                field: "user_agent",
            });
        }
        if self.max_idle_conns < 1 {
            return Err(OptionsError::CountTooSmall {
                field: "max_idle_conns",
                min: 1,
            });
        }
        if self.max_conns_per_host < 1 {
            return Err(OptionsError::CountTooSmall {
                field: "max_conns_per_host",
                min: 1,
            });
        }
        if self.max_conns_per_host > MAX_CONNS_PER_HOST {
            return Err(OptionsError::CountTooLarge {
                field: "max_conns_per_host",
                max: MAX_CONNS_PER_HOST,
            });
        }
        check_duration(
            "idle_conn_timeout",
            self.idle_conn_timeout,
            MIN_IDLE_CONN_TIMEOUT,
            MAX_IDLE_CONN_TIMEOUT,
        )?;
        if self.max_redirects > MAX_REDIRECTS {
            return Err(OptionsError::CountTooLarge {
                field: "max_redirects",
                max: MAX_REDIRECTS,
            });
        }
        if self.alerts_endpoint.trim().is_empty() {
            return Err(OptionsError::Empty {
                field: "alerts_endpoint",
            });
        }
        if self.ping_endpoint.trim().is_empty() {
            return Err(OptionsError::Empty {
                field: "ping_endpoint",
            });
        }
        for (name, value) in &self.headers {
            HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                OptionsError::InvalidHeader {
                    name: name.clone(),
                    reason: err.to_string(),
                }
            })?;
            HeaderValue::from_str(value).map_err(|err| OptionsError::InvalidHeader {
                name: name.clone(),
                reason: err.to_string(),
            })?;
        }
        Ok(())
    }
}

fn check_duration(
    field: &'static str,
    value: Duration,
    min: Duration,
    max: Duration,
) -> Result<(), OptionsError> {
    if value < min {
        return Err(OptionsError::DurationTooShort { field, min });
    }
    if value > max {
        return Err(OptionsError::DurationTooLong { field, max });
    }
    Ok(())
}
