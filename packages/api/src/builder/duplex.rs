//! `DuplexBuilder` for WebSocket connections

use std::time::Duration;

use http::header::{HeaderName, HeaderValue};
use wireline_client::duplex::{Handler, HookTable};
use wireline_client::error;
use wireline_client::{
    CapabilityReport, CloseEvent, DuplexClient, DuplexConfig, DuplexMessage, Error, Peer, Result,
};

/// Fluent configuration for a [`DuplexClient`].
///
/// # Examples
/// ```no_run
/// # async fn run() -> wireline::Result<()> {
/// let feed = wireline::duplex("ws://127.0.0.1:9000/feed")
///     .protocol("feed.v2")
///     .on_message(|message| println!("{:?}", message.as_text()))
///     .build()?;
///
/// feed.connect().await?;
/// feed.send_json(&serde_json::json!({"subscribe": "prices"}))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DuplexBuilder {
    config: DuplexConfig,
    hooks: HookTable,
    error: Option<Error>,
}

impl DuplexBuilder {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        DuplexBuilder {
            config: DuplexConfig::new(url),
            hooks: HookTable::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Offer `protocol` during the handshake. Call repeatedly to offer
    /// several, in preference order.
    #[must_use]
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.config = self.config.protocol(protocol);
        self
    }

    #[must_use]
    pub fn protocols<I, P>(self, protocols: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        protocols.into_iter().fold(self, DuplexBuilder::protocol)
    }

    /// Handshake header. Only the library transport can send these.
    #[must_use]
    pub fn header(mut self, key: &str, value: &str) -> Self {
        match (HeaderName::try_from(key), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.config.headers.insert(name, value);
            }
            (Err(e), _) => self.defer(error::builder(e)),
            (_, Err(e)) => self.defer(error::builder(e)),
        }
        self
    }

    /// Give up on the handshake after `timeout`.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Drop the connection when the peer leaves a close unanswered for
    /// `timeout`.
    #[must_use]
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.close_timeout(timeout);
        self
    }

    /// Select a transport from `report` instead of probing the environment.
    #[must_use]
    pub fn capabilities(mut self, report: CapabilityReport) -> Self {
        self.config = self.config.capabilities(report);
        self
    }

    #[must_use]
    pub fn hooks(mut self, hooks: HookTable) -> Self {
        self.hooks = hooks;
        self
    }

    #[must_use]
    pub fn on(mut self, handler: Handler) -> Self {
        self.hooks.set(handler);
        self
    }

    #[must_use]
    pub fn on_open(self, f: impl Fn(&Peer) + Send + Sync + 'static) -> Self {
        self.on(Handler::open(f))
    }

    #[must_use]
    pub fn on_message(self, f: impl Fn(&DuplexMessage) + Send + Sync + 'static) -> Self {
        self.on(Handler::message(f))
    }

    #[must_use]
    pub fn on_close(self, f: impl Fn(&CloseEvent) + Send + Sync + 'static) -> Self {
        self.on(Handler::close(f))
    }

    #[must_use]
    pub fn on_error(self, f: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.on(Handler::error(f))
    }

    /// Validate the settings and create the client. Nothing connects until
    /// [`DuplexClient::connect`].
    pub fn build(self) -> Result<DuplexClient> {
        if let Some(e) = self.error {
            return Err(e);
        }
        self.config.validate()?;
        Ok(DuplexClient::with_hooks(self.config, self.hooks))
    }

    fn defer(&mut self, e: Error) {
        if self.error.is_none() {
            self.error = Some(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wireline_client::duplex::HookEvent;

    #[test]
    fn test_builds_with_hooks_and_protocols() {
        let client = DuplexBuilder::new("ws://127.0.0.1:9/")
            .protocols(["a.v1", "b.v1"])
            .timeout(Duration::from_secs(2))
            .close_timeout(Duration::from_millis(500))
            .on_message(|_| {})
            .on_close(|_| {})
            .build()
            .unwrap();

        assert_eq!(client.config().protocols, vec!["a.v1", "b.v1"]);
        assert_eq!(client.config().connect_timeout, Duration::from_secs(2));
        assert_eq!(client.config().close_timeout, Duration::from_millis(500));
        assert!(client.hooks().has(HookEvent::Message));
        assert!(client.hooks().has(HookEvent::Close));
        assert!(!client.hooks().has(HookEvent::Open));
    }

    #[test]
    fn test_rejects_http_urls() {
        assert!(DuplexBuilder::new("http://127.0.0.1/").build().unwrap_err().is_builder());
    }

    #[test]
    fn test_bad_header_reported_at_build() {
        let err = DuplexBuilder::new("ws://127.0.0.1/").header("x", "a\nb").build().unwrap_err();
        assert!(err.is_builder());
    }

    #[test]
    fn test_url_can_be_replaced() {
        let client = DuplexBuilder::new("invalid").url("wss://127.0.0.1/feed").build().unwrap();
        assert_eq!(client.config().url, "wss://127.0.0.1/feed");
    }
}
