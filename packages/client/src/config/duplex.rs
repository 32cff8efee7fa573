//! Duplex connection configuration

use std::time::Duration;

use http::HeaderMap;

use super::validation::{ConfigDefaults, ConfigValidator, ConfigurationError};
use crate::runtime::CapabilityReport;

/// Connection options for a [`DuplexClient`](crate::DuplexClient).
#[derive(Debug, Clone)]
pub struct DuplexConfig {
    /// `ws://` or `wss://` target
    pub url: String,
    /// Offered sub-protocols, in preference order
    pub protocols: Vec<String>,
    /// Extra handshake headers. Browsers do not allow custom handshake
    /// headers, so only the library transport sends these.
    pub headers: HeaderMap,
    pub connect_timeout: Duration,
    /// Deadline for the closing handshake. A peer that does not answer the
    /// close frame in time is dropped with an abnormal close.
    pub close_timeout: Duration,
    /// Use this report instead of probing the environment
    pub capabilities: Option<CapabilityReport>,
}

impl DuplexConfig {
    pub fn new(url: impl Into<String>) -> Self {
        DuplexConfig {
            url: url.into(),
            protocols: Vec::new(),
            headers: HeaderMap::new(),
            connect_timeout: ConfigDefaults::DEFAULT_CONNECT_TIMEOUT,
            close_timeout: ConfigDefaults::DEFAULT_CLOSE_TIMEOUT,
            capabilities: None,
        }
    }

    #[must_use]
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocols.push(protocol.into());
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    #[must_use]
    pub fn capabilities(mut self, report: CapabilityReport) -> Self {
        self.capabilities = Some(report);
        self
    }

    /// Parsed target URL.
    pub fn parsed_url(&self) -> crate::Result<url::Url> {
        Ok(ConfigValidator::validate_url(&self.url, &["ws", "wss"], "url")?)
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.parsed_url()?;
        ConfigValidator::validate_timeout(self.connect_timeout, "connect_timeout")?;
        ConfigValidator::validate_timeout(self.close_timeout, "close_timeout")?;
        for protocol in &self.protocols {
            let is_token = !protocol.is_empty()
                && protocol
                    .bytes()
                    .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b));
            if !is_token {
                return Err(ConfigurationError::InvalidParameter(format!("invalid sub-protocol {protocol:?}")).into());
            }
        }
        Ok(())
    }
}
