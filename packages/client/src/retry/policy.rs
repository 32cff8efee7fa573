//! Retry policy configuration with exponential backoff and optional jitter

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use fastrand::Rng;
use http::{Method, StatusCode};

use crate::error::{self, Error, Kind};

/// Decides whether `error` on attempt `attempt` (1-based) may be retried.
pub type RetryPredicate = Arc<dyn Fn(&Error, u32) -> bool + Send + Sync>;

/// Observes each scheduled retry: the failure, the attempt that failed and
/// the delay before the next one. Cannot influence the outcome.
pub type RetryObserver = Arc<dyn Fn(&Error, u32, Duration) + Send + Sync>;

/// Status codes retried when no custom set is configured.
pub const DEFAULT_RETRYABLE_STATUSES: [StatusCode; 6] = [
    StatusCode::REQUEST_TIMEOUT,
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Retry policy configuration
#[derive(Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Backoff multiplier (typically 2.0 for exponential backoff)
    pub backoff_multiplier: f64,
    /// Jitter factor in `0.0..=1.0`. Zero disables jitter.
    pub jitter_factor: f64,
    pub retryable_statuses: Vec<StatusCode>,
    /// Retry POST/PATCH and other non-idempotent requests too.
    pub retry_non_idempotent: bool,
    pub should_retry: Option<RetryPredicate>,
    pub on_retry: Option<RetryObserver>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
            retry_non_idempotent: false,
            should_retry: None,
            on_retry: None,
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("jitter_factor", &self.jitter_factor)
            .field("retryable_statuses", &self.retryable_statuses)
            .field("retry_non_idempotent", &self.retry_non_idempotent)
            .field("should_retry", &self.should_retry.is_some())
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

impl RetryPolicy {
    /// Faster retry cycles with more attempts for operations that must succeed.
    #[inline]
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 1.5,
            ..Self::default()
        }
    }

    /// Longer delays and fewer attempts for operations that can tolerate failure.
    #[inline]
    #[must_use]
    pub fn conservative() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 3.0,
            ..Self::default()
        }
    }

    /// Single attempt only.
    #[inline]
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, base_delay: Duration, multiplier: f64, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.backoff_multiplier = multiplier;
        self.max_delay = max_delay;
        self
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor;
        self
    }

    #[must_use]
    pub fn with_retryable_statuses(mut self, statuses: impl IntoIterator<Item = StatusCode>) -> Self {
        self.retryable_statuses = statuses.into_iter().collect();
        self
    }

    #[must_use]
    pub fn retry_non_idempotent(mut self, enabled: bool) -> Self {
        self.retry_non_idempotent = enabled;
        self
    }

    #[must_use]
    pub fn with_should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Error, u32) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Some(Arc::new(predicate));
        self
    }

    #[must_use]
    pub fn with_on_retry<F>(mut self, observer: F) -> Self
    where
        F: Fn(&Error, u32, Duration) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(observer));
        self
    }

    /// Delay before the retry that follows failed attempt `attempt`:
    /// `min(base_delay * multiplier^(attempt - 1), max_delay)`, then jitter.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let base_ms = self.base_delay.as_secs_f64() * 1000.0;
        let max_ms = self.max_delay.as_secs_f64() * 1000.0;
        let capped = (base_ms * self.backoff_multiplier.powi(exponent)).min(max_ms);

        let jittered = if self.jitter_factor > 0.0 {
            let range = capped * self.jitter_factor;
            let jitter = Rng::new().f64() * range - range / 2.0;
            (capped + jitter).clamp(0.0, max_ms)
        } else {
            capped
        };

        Duration::from_micros((jittered * 1000.0).round() as u64)
    }

    /// Whether `error` from attempt `attempt` may be retried.
    ///
    /// A configured predicate replaces the default classification, which
    /// accepts retryable statuses and transport failures.
    #[must_use]
    pub fn should_retry(&self, error: &Error, attempt: u32) -> bool {
        match &self.should_retry {
            Some(predicate) => predicate(error, attempt),
            None => self.is_retryable_error(error),
        }
    }

    #[must_use]
    pub fn is_retryable_error(&self, error: &Error) -> bool {
        match error.kind() {
            Kind::Transport { .. } => true,
            Kind::Status(status) => self.retryable_statuses.contains(&status),
            Kind::Builder
            | Kind::Decode
            | Kind::Aborted
            | Kind::Timeout
            | Kind::ConnectionTimeout
            | Kind::NoTransport
            | Kind::NotConnected => false,
        }
    }

    /// Whether a request with `method` may be re-sent after `error`.
    ///
    /// Failures before the connection was established never reached the
    /// peer and are always safe to repeat.
    #[must_use]
    pub fn allows_method(&self, method: &Method, error: &Error) -> bool {
        error.is_connect() || self.retry_non_idempotent || is_idempotent(method)
    }

    pub(crate) fn notify_retry(&self, error: &Error, attempt: u32, delay: Duration) {
        if let Some(observer) = &self.on_retry {
            observer(error, attempt, delay);
        }
    }

    /// Reject inconsistent configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_attempts == 0 {
            return Err(error::builder("max_attempts must be at least 1"));
        }

        if !(self.backoff_multiplier.is_finite() && self.backoff_multiplier > 0.0) {
            return Err(error::builder("backoff_multiplier must be positive"));
        }

        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(error::builder("jitter_factor must be between 0.0 and 1.0"));
        }

        if self.base_delay > self.max_delay {
            return Err(error::builder("base_delay cannot exceed max_delay"));
        }

        Ok(())
    }
}

fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS | Method::TRACE
    )
}
