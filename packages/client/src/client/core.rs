//! Core HTTP client
//!
//! `HttpClient` owns the base configuration, the transport seam and the
//! shared statistics. The exchange pipeline lives in `execute`; verb and
//! body conveniences live next to it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::transport::{default_transport, HttpTransport};
use crate::scheduling::Instant;
use crate::telemetry::ClientStats;

/// Request/response client.
///
/// Cloning is cheap: clones share configuration, transport and statistics.
#[derive(Clone)]
pub struct HttpClient {
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) transport: Arc<dyn HttpTransport>,
    pub(crate) stats: Arc<ClientStats>,
    created_at: Instant,
}

impl HttpClient {
    /// Validate `config` and build a client on the default transport for the
    /// current target.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = default_transport(&config);
        Ok(Self::assemble(config, transport))
    }

    /// Build a client on a caller-supplied transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, transport))
    }

    /// Builder starting from [`ClientConfig::default`].
    #[inline]
    #[must_use]
    pub fn builder() -> super::HttpClientBuilder {
        super::HttpClientBuilder::new()
    }

    fn assemble(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            stats: Arc::new(ClientStats::default()),
            created_at: Instant::now(),
        }
    }

    /// Statistics shared by every clone of this client
    #[inline]
    #[must_use]
    pub fn stats(&self) -> Arc<ClientStats> {
        Arc::clone(&self.stats)
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    /// Time since construction
    #[inline]
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.created_at.elapsed()
    }
}

impl Default for HttpClient {
    /// Client with the default configuration, which is always valid.
    fn default() -> Self {
        let config = ClientConfig::default();
        let transport = default_transport(&config);
        Self::assemble(config, transport)
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}
