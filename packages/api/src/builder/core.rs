//! Core `HttpBuilder` structure and base functionality

use std::time::Duration;

use wireline_client::{ClientConfig, HttpClient, HttpClientBuilder, Result, RetryPolicy};

/// Fluent configuration for an [`HttpClient`].
///
/// # Examples
/// ```no_run
/// use std::time::Duration;
///
/// # fn run() -> wireline::Result<()> {
/// let client = wireline::http()
///     .base_url("http://127.0.0.1:8080/v1/")
///     .timeout(Duration::from_secs(10))
///     .max_attempts(5)
///     .bearer_auth("sk-test")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct HttpBuilder {
    pub(crate) inner: HttpClientBuilder,
    /// Retry policy being assembled; applied at `build`
    pub(crate) retry: Option<RetryPolicy>,
}

impl HttpBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    #[must_use]
    pub fn from_config(config: ClientConfig) -> Self {
        HttpBuilder {
            retry: Some(config.retry.clone()),
            inner: HttpClientBuilder::from_config(config),
        }
    }

    /// Resolve relative request targets against `url`.
    #[must_use]
    pub fn base_url(mut self, url: &str) -> Self {
        self.inner = self.inner.base_url(url);
        self
    }

    /// Overall deadline for each request, retries included.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.timeout(timeout);
        self
    }

    #[must_use]
    pub fn no_timeout(mut self) -> Self {
        self.inner = self.inner.no_timeout();
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.connect_timeout(timeout);
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Keep the current retry policy but change how many attempts it makes.
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        let policy = self.retry.take().unwrap_or_default();
        self.retry = Some(policy.with_max_attempts(attempts));
        self
    }

    /// Never retry.
    #[must_use]
    pub fn no_retry(self) -> Self {
        self.retry(RetryPolicy::no_retry())
    }

    #[must_use]
    pub fn user_agent(mut self, agent: &str) -> Self {
        self.inner = self.inner.user_agent(agent);
        self
    }

    /// Fail reads of response bodies larger than `limit` bytes.
    #[must_use]
    pub fn max_response_bytes(mut self, limit: usize) -> Self {
        self.inner = self.inner.max_response_bytes(limit);
        self
    }

    /// Build the client, reporting the first invalid setting.
    pub fn build(self) -> Result<HttpClient> {
        let HttpBuilder { inner, retry } = self;
        let inner = match retry {
            Some(policy) => inner.retry(policy),
            None => inner,
        };
        let client = inner.build()?;
        tracing::debug!(
            target: "wireline::http",
            base_url = ?client.config().base_url.as_ref().map(|url| url.as_str()),
            "http client built"
        );
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_attempts_adjusts_policy() {
        let client = HttpBuilder::new().max_attempts(7).build().unwrap();
        assert_eq!(client.config().retry.max_attempts, 7);
    }

    #[test]
    fn test_retry_then_max_attempts_keeps_backoff() {
        let policy = RetryPolicy::default().with_backoff(Duration::from_millis(1), 3.0, Duration::from_millis(9));
        let client = HttpBuilder::new().retry(policy).max_attempts(2).build().unwrap();
        let retry = &client.config().retry;
        assert_eq!(retry.max_attempts, 2);
        assert_eq!(retry.base_delay, Duration::from_millis(1));
    }

    #[test]
    fn test_invalid_base_url_reported_at_build() {
        let err = HttpBuilder::new().base_url("not a url").build().unwrap_err();
        assert!(err.is_builder());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        assert!(HttpBuilder::new().max_attempts(0).build().unwrap_err().is_builder());
    }
}
