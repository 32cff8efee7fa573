//! HTTP client configuration

use std::time::Duration;

use http::HeaderMap;
use url::Url;

use super::validation::{ConfigDefaults, ConfigResult, ConfigValidator, ConfigurationError};
use crate::retry::RetryPolicy;

/// Base configuration of an [`HttpClient`](crate::HttpClient).
///
/// Per-call [`RequestOptions`](crate::RequestOptions) override these field by
/// field.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relative targets are joined onto this URL
    pub base_url: Option<Url>,
    /// Whole-exchange deadline, retries included. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Connection establishment deadline (server transport only)
    pub connect_timeout: Option<Duration>,
    /// Sent with every request unless overridden per call
    pub headers: HeaderMap,
    pub user_agent: String,
    pub retry: RetryPolicy,
    /// Materialized bodies larger than this fail with a decode error
    pub max_response_bytes: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: None,
            timeout: Some(ConfigDefaults::DEFAULT_TIMEOUT),
            connect_timeout: Some(ConfigDefaults::DEFAULT_CONNECT_TIMEOUT),
            headers: HeaderMap::new(),
            user_agent: ConfigDefaults::DEFAULT_USER_AGENT.to_owned(),
            retry: RetryPolicy::default(),
            max_response_bytes: None,
        }
    }
}

impl ClientConfig {
    /// Parse and set the base URL.
    pub fn with_base_url(mut self, base_url: &str) -> crate::Result<Self> {
        self.base_url = Some(ConfigValidator::validate_url(base_url, &["http", "https"], "base_url")?);
        Ok(self)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn validate(&self) -> crate::Result<()> {
        ConfigValidator::validate_optional_timeout(self.timeout, "timeout")?;
        ConfigValidator::validate_optional_timeout(self.connect_timeout, "connect_timeout")?;
        ConfigValidator::validate_non_empty(&self.user_agent, "user_agent")?;
        if self.max_response_bytes == Some(0) {
            return Err(ConfigurationError::InvalidParameter("max_response_bytes cannot be zero".into()).into());
        }
        check_base(self.base_url.as_ref())?;
        self.retry.validate()
    }
}

fn check_base(base_url: Option<&Url>) -> ConfigResult<()> {
    match base_url {
        Some(url) if url.cannot_be_a_base() => Err(ConfigurationError::InvalidAddress(format!(
            "base_url {url} cannot be a base"
        ))),
        _ => Ok(()),
    }
}
