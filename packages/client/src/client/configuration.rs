//! HTTP client construction

use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderName, HeaderValue};

use super::HttpClient;
use crate::config::ClientConfig;
use crate::error::{self, Error, Result};
use crate::http::transport::HttpTransport;
use crate::retry::RetryPolicy;

/// HTTP client builder for configuration
///
/// Invalid input (an unparseable base URL, a bad header) is kept and
/// reported by [`build`](Self::build).
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    error: Option<Error>,
}

impl HttpClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        match self.config.clone().with_base_url(base_url) {
            Ok(config) => self.config = config,
            Err(e) => self.defer(e),
        }
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Wait indefinitely unless a call sets its own timeout.
    pub fn no_timeout(mut self) -> Self {
        self.config.timeout = None;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        let parsed = HeaderName::try_from(key)
            .map_err(Into::<http::Error>::into)
            .and_then(|name| {
                HeaderValue::try_from(value)
                    .map(|value| (name, value))
                    .map_err(Into::<http::Error>::into)
            });
        match parsed {
            Ok((name, value)) => {
                self.config.headers.insert(name, value);
            }
            Err(e) => self.defer(error::builder(e)),
        }
        self
    }

    /// Send `Authorization: Bearer <token>` on every request.
    pub fn bearer_auth(mut self, token: &str) -> Self {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                self.config.headers.insert(http::header::AUTHORIZATION, value);
            }
            Err(e) => self.defer(error::builder(e)),
        }
        self
    }

    pub fn user_agent(mut self, agent: &str) -> Self {
        self.config.user_agent = agent.to_string();
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn max_response_bytes(mut self, limit: usize) -> Self {
        self.config.max_response_bytes = Some(limit);
        self
    }

    /// Replace the default transport, typically with a test double.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        if let Some(e) = self.error {
            return Err(e);
        }
        match self.transport {
            Some(transport) => HttpClient::with_transport(self.config, transport),
            None => HttpClient::new(self.config),
        }
    }

    fn defer(&mut self, e: Error) {
        if self.error.is_none() {
            self.error = Some(e);
        }
    }
}
