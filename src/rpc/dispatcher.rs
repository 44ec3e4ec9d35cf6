//! Outbound network dispatcher.
//!
//! One HTTP client, optionally routed through a forward proxy, built once at
//! setup and handed by value (it is a cheap handle) to every component that
//! makes outbound calls. Nothing mutates it after construction.

use std::time::Duration;
use url::Url;

/// Connect timeout applied to every outbound connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct OutboundDispatcher {
    client: reqwest::Client,
    proxy: Option<Url>,
}

impl OutboundDispatcher {
    /// Build a dispatcher, routing all traffic through `proxy` when given.
    pub fn new(proxy: Option<&Url>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().connect_timeout(CONNECT_TIMEOUT);
        if let Some(proxy_url) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
            tracing::info!(proxy = %redact(proxy_url), "Outbound traffic routed through proxy");
        }

        Ok(Self {
            client: builder.build()?,
            proxy: proxy.cloned(),
        })
    }

    /// A dispatcher that connects directly.
    pub fn direct() -> Result<Self, reqwest::Error> {
        Self::new(None)
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn proxy(&self) -> Option<&Url> {
        self.proxy.as_ref()
    }
}

/// Strip credentials from a proxy URL before it reaches the logs.
fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    if !shown.username().is_empty() || shown.password().is_some() {
        let _ = shown.set_username("***");
        let _ = shown.set_password(None);
    }
    shown.to_string()
}
