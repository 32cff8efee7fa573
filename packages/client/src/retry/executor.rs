use std::future::Future;

use super::RetryPolicy;
use crate::error::{Error, Result};
use crate::scheduling::{delay, AbortSignal};

/// Run `operation` until it succeeds or `policy` gives up.
///
/// Attempts are numbered from 1 and run strictly one after another. After a
/// failure the policy decides whether to retry; if it does and attempts
/// remain, the backoff delay is awaited (cancellable through `signal`) and the
/// operation runs again. The last error is returned unchanged.
pub async fn retry<F, Fut, T>(operation: F, policy: &RetryPolicy, signal: Option<&AbortSignal>) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_when(operation, policy, signal, |error, attempt| policy.should_retry(error, attempt)).await
}

/// Like [`retry`] with a caller-supplied retry decision in place of
/// [`RetryPolicy::should_retry`].
pub async fn retry_when<F, Fut, T, P>(
    mut operation: F,
    policy: &RetryPolicy,
    signal: Option<&AbortSignal>,
    mut retryable: P,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
    P: FnMut(&Error, u32) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        if let Some(signal) = signal {
            signal.check()?;
        }

        let error = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if attempt >= max_attempts || error.is_aborted() || !retryable(&error, attempt) {
            return Err(error);
        }

        let wait = policy.delay_for(attempt);
        tracing::warn!(
            target: "wireline::retry",
            attempt,
            max_attempts,
            delay_ms = wait.as_millis() as u64,
            error = %error,
            "attempt failed, retrying"
        );
        policy.notify_retry(&error, attempt, wait);

        delay(wait, signal).await?;
        attempt += 1;
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::error;
    use crate::scheduling::{AbortController, Instant};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(max_attempts)
            .with_backoff(Duration::from_millis(10), 2.0, Duration::from_millis(35))
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_operation_runs_exactly_max_attempts() {
        let policy = fast_policy(4);
        let mut calls = 0;
        let err = retry(
            |_| {
                calls += 1;
                async { Err::<(), _>(error::connect("refused")) }
            },
            &policy,
            None,
        )
        .await
        .unwrap_err();

        assert_eq!(calls, 4);
        assert!(err.is_connect());
    }

    #[tokio::test(start_paused = true)]
    async fn observer_sees_capped_geometric_delays() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let policy = fast_policy(5).with_on_retry(move |_, attempt, delay| {
            sink.lock().unwrap().push((attempt, delay));
        });

        let start = Instant::now();
        let _ = retry(|_| async { Err::<(), _>(error::connect("refused")) }, &policy, None).await;

        let expected = vec![
            (1, Duration::from_millis(10)),
            (2, Duration::from_millis(20)),
            (3, Duration::from_millis(35)),
            (4, Duration::from_millis(35)),
        ];
        assert_eq!(*seen.lock().unwrap(), expected);
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let policy = fast_policy(4);
        let value = retry(
            |attempt| async move {
                if attempt < 3 {
                    Err(error::status(http::StatusCode::SERVICE_UNAVAILABLE, None, None))
                } else {
                    Ok(attempt)
                }
            },
            &policy,
            None,
        )
        .await
        .unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_returns_immediately() {
        let policy = fast_policy(4);
        let mut calls = 0;
        let err = retry(
            |_| {
                calls += 1;
                async { Err::<(), _>(error::status(http::StatusCode::NOT_FOUND, None, None)) }
            },
            &policy,
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(calls, 1);
        assert_eq!(err.status(), Some(http::StatusCode::NOT_FOUND));
    }

    #[tokio::test(start_paused = true)]
    async fn abort_during_backoff_stops_retrying() {
        let controller = AbortController::new();
        let signal = controller.signal();
        let policy = fast_policy(10).with_backoff(Duration::from_secs(60), 1.0, Duration::from_secs(60));

        let task = tokio::spawn(async move {
            retry(|_| async { Err::<(), _>(error::connect("refused")) }, &policy, Some(&signal)).await
        });
        tokio::time::sleep(Duration::from_millis(5)).await;
        controller.abort();

        assert!(task.await.unwrap().unwrap_err().is_aborted());
    }
}
