//! Process-wide default client

use std::sync::{Arc, OnceLock};

use super::HttpClient;
use crate::config::ClientConfig;
use crate::error::{self, Result};
use crate::telemetry::ClientStatsSnapshot;

static GLOBAL_CLIENT: OnceLock<Arc<HttpClient>> = OnceLock::new();

/// Shared client, created with the default configuration on first use
/// unless [`init_global_client`] ran first.
pub fn global_client() -> Arc<HttpClient> {
    Arc::clone(GLOBAL_CLIENT.get_or_init(|| Arc::new(HttpClient::default())))
}

/// Statistics of the shared client.
#[must_use]
pub fn global_stats() -> ClientStatsSnapshot {
    global_client().stats().snapshot()
}

/// Install the shared client with `config`.
///
/// Fails when `config` is invalid or the shared client already exists; the
/// existing client stays in place either way.
pub fn init_global_client(config: ClientConfig) -> Result<()> {
    let client = HttpClient::new(config).inspect_err(|e| {
        tracing::error!(target: "wireline::http", error = %e, "invalid global client configuration");
    })?;

    GLOBAL_CLIENT.set(Arc::new(client)).map_err(|_| {
        tracing::error!(target: "wireline::http", "global client already initialized");
        error::builder("global client already initialized")
    })
}
