use std::fmt;
use std::sync::{Arc, OnceLock};

use reqwest::{Method, Url};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    report::sanitize_url, transport::Transport, wire::AlertsList, AlertClientError,
    ClientOptions, RequestContext, ResponseMetadata, Result,
};

enum Setup {
    Unstarted,
    Done(Result<()>),
}

/// HTTP client for the alerts API.
///
/// Create it with [`AlertClient::new`], call [`AlertClient::connect`] once,
/// then submit alerts with [`AlertClient::send`]. The client is meant to be
/// shared (for example behind an [`Arc`]) by concurrent tasks.
pub struct AlertClient {
    base_url: String,
    options: ClientOptions,
    setup: Mutex<Setup>,
    transport: OnceLock<Transport>,
}

impl fmt::Debug for AlertClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertClient")
            .field("base_url", &sanitize_url(&self.base_url))
            .field("options", &self.options)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl AlertClient {
    /// Creates an unconnected client for `base_url`.
    pub fn new(base_url: impl Into<String>, options: ClientOptions) -> Self {
        Self {
            base_url: base_url.into(),
            options,
            setup: Mutex::new(Setup::Unstarted),
            transport: OnceLock::new(),
        }
    }

    /// Creates an unconnected client from environment variables.
    ///
    /// Reads:
    /// - `ALERTS_API_URL` — base URL of the alerts API
    /// - `ALERTS_API_TOKEN` — optional bearer token
    pub fn from_env() -> std::result::Result<Self, String> {
        let url = std::env::var("ALERTS_API_URL")
            .map_err(|_| "missing ALERTS_API_URL environment variable".to_owned())?;
        if url.trim().is_empty() {
            return Err("ALERTS_API_URL is set but empty".to_owned());
        }
        let mut options = ClientOptions::default();
        if let Ok(token) = std::env::var("ALERTS_API_TOKEN") {
            options = options.with_auth_token(token.trim());
        }
        Ok(Self::new(url.trim(), options))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Validates options, builds the transport and pings the API.
    ///
    /// Setup runs at most once per client, no matter how many tasks call
    /// this concurrently; every caller observes the same outcome, and a
    /// failed client stays failed. Create a new client to try again.
    ///
    /// If the future running setup is dropped (for example by a timeout),
    /// later calls return [`AlertClientError::SetupInterrupted`].
    pub async fn connect(&self, ctx: &RequestContext) -> Result<()> {
        let mut setup = self.setup.lock().await;
        if let Setup::Done(outcome) = &*setup {
            return outcome.clone();
        }
        // Stays in place if this future is dropped before setup finishes.
        *setup = Setup::Done(Err(AlertClientError::SetupInterrupted));

        let outcome = self.run_setup(ctx).await;

        #[cfg(feature = "tracing")]
        match &outcome {
            Ok(()) => tracing::info!(base_url = %sanitize_url(&self.base_url), "connected to alerts API"),
            Err(err) => tracing::warn!(base_url = %sanitize_url(&self.base_url), error = %err, "alerts API setup failed"),
        }

        *setup = Setup::Done(outcome.clone());
        outcome
    }

    async fn run_setup(&self, ctx: &RequestContext) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(AlertClientError::MissingBaseUrl);
        }
        self.options.validate()?;
        Url::parse(&self.base_url)
            .map_err(|err| AlertClientError::InvalidBaseUrl(err.to_string()))?;

        let transport = Transport::build(&self.base_url, &self.options)?;
        let http = transport.client().ok_or(AlertClientError::Closed)?;
        transport
            .request(&http, ctx, Method::GET, &self.options.ping_endpoint, None)
            .await
            .map_err(|err| AlertClientError::Ping(Box::new(err)))?;

        // Only this holder of the setup lock ever sets the cell.
        let _ = self.transport.set(transport);
        Ok(())
    }

    /// True after a successful [`AlertClient::connect`] and before [`AlertClient::close`].
    pub fn is_connected(&self) -> bool {
        self.transport
            .get()
            .is_some_and(|transport| transport.client().is_some())
    }

    /// Posts one or more alerts.
    ///
    /// Elements that serialize to JSON `null` (such as `Option::None`) are
    /// rejected with their index before any request is made.
    pub async fn send<A: Serialize>(&self, ctx: &RequestContext, alerts: &[A]) -> Result<()> {
        self.send_with_response(ctx, alerts).await.map(|_| ())
    }

    /// Like [`AlertClient::send`], returning response metadata on success.
    ///
    /// On a non-2xx response the metadata is available through
    /// [`AlertClientError::response_metadata`].
    pub async fn send_with_response<A: Serialize>(
        &self,
        ctx: &RequestContext,
        alerts: &[A],
    ) -> Result<ResponseMetadata> {
        let (transport, http) = self.ready()?;
        let body = encode_alerts(alerts)?;
        transport
            .request(&http, ctx, Method::POST, &self.options.alerts_endpoint, Some(body))
            .await
    }

    /// Checks that the API is still reachable.
    pub async fn ping(&self, ctx: &RequestContext) -> Result<()> {
        let (transport, http) = self.ready()?;
        transport
            .request(&http, ctx, Method::GET, &self.options.ping_endpoint, None)
            .await
            .map(|_| ())
    }

    /// Releases idle pooled connections. Safe to call more than once.
    ///
    /// Requests already in flight complete normally; later requests fail
    /// with [`AlertClientError::Closed`]. Clones handed out by
    /// [`AlertClient::http_client`] share the pool and keep it alive until
    /// the caller drops them.
    pub fn close(&self) {
        if let Some(transport) = self.transport.get() {
            transport.close();
        }
    }

    /// The underlying `reqwest` client, if connected and not closed.
    ///
    /// The returned handle shares this client's connection pool and is not
    /// affected by a later [`AlertClient::close`].
    pub fn http_client(&self) -> Option<reqwest::Client> {
        self.transport.get().and_then(Transport::client)
    }

    fn ready(&self) -> Result<(&Transport, reqwest::Client)> {
        let transport = self.transport.get().ok_or(AlertClientError::NotConnected)?;
        let http = transport.client().ok_or(AlertClientError::Closed)?;
        Ok((transport, http))
    }
}

/// Operations available on a possibly absent client handle.
///
/// Implemented for [`AlertClient`] and for `Option<&AlertClient>`, where
/// `None` yields [`AlertClientError::NilClient`] instead of a panic.
#[allow(async_fn_in_trait)]
pub trait AlertSender {
    async fn send<A: Serialize>(&self, ctx: &RequestContext, alerts: &[A]) -> Result<()>;

    async fn send_with_response<A: Serialize>(
        &self,
        ctx: &RequestContext,
        alerts: &[A],
    ) -> Result<ResponseMetadata>;

    async fn ping(&self, ctx: &RequestContext) -> Result<()>;
}

impl AlertSender for AlertClient {
    async fn send<A: Serialize>(&self, ctx: &RequestContext, alerts: &[A]) -> Result<()> {
        AlertClient::send(self, ctx, alerts).await
    }

    async fn send_with_response<A: Serialize>(
        &self,
        ctx: &RequestContext,
        alerts: &[A],
    ) -> Result<ResponseMetadata> {
        AlertClient::send_with_response(self, ctx, alerts).await
    }

    async fn ping(&self, ctx: &RequestContext) -> Result<()> {
        AlertClient::ping(self, ctx).await
    }
}

impl AlertSender for Option<&AlertClient> {
    async fn send<A: Serialize>(&self, ctx: &RequestContext, alerts: &[A]) -> Result<()> {
        let client = self.ok_or(AlertClientError::NilClient)?;
        AlertClient::send(client, ctx, alerts).await
    }

    async fn send_with_response<A: Serialize>(
        &self,
        ctx: &RequestContext,
        alerts: &[A],
    ) -> Result<ResponseMetadata> {
        let client = self.ok_or(AlertClientError::NilClient)?;
        AlertClient::send_with_response(client, ctx, alerts).await
    }

    async fn ping(&self, ctx: &RequestContext) -> Result<()> {
        let client = self.ok_or(AlertClientError::NilClient)?;
        AlertClient::ping(client, ctx).await
    }
}

impl AlertSender for Option<Arc<AlertClient>> {
    async fn send<A: Serialize>(&self, ctx: &RequestContext, alerts: &[A]) -> Result<()> {
        self.as_deref().send(ctx, alerts).await
    }

    async fn send_with_response<A: Serialize>(
        &self,
        ctx: &RequestContext,
        alerts: &[A],
    ) -> Result<ResponseMetadata> {
        self.as_deref().send_with_response(ctx, alerts).await
    }

    async fn ping(&self, ctx: &RequestContext) -> Result<()> {
        self.as_deref().ping(ctx).await
    }
}

fn encode_alerts<A: Serialize>(alerts: &[A]) -> Result<Vec<u8>> {
    if alerts.is_empty() {
        return Err(AlertClientError::EmptyAlerts);
    }

    let mut values = Vec::with_capacity(alerts.len());
    for (index, alert) in alerts.iter().enumerate() {
        let value = serde_json::to_value(alert)
            .map_err(|err| AlertClientError::Encode(Arc::new(err)))?;
        if value.is_null() {
            return Err(AlertClientError::NilAlert { index });
        }
        values.push(value);
    }

    serde_json::to_vec(&AlertsList { alerts: values })
        .map_err(|err| AlertClientError::Encode(Arc::new(err)))
}
