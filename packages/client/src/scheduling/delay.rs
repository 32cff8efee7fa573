use std::future::Future;
use std::time::Duration;

use futures::future::{select, Either};

use super::abort::AbortSignal;
use super::timer::sleep;
use crate::error::{self, Result};

/// Suspend for `duration` unless `signal` fires first.
///
/// Abort rejects with the aborted kind and releases the timer. A signal that
/// has already fired rejects without arming a timer.
pub async fn delay(duration: Duration, signal: Option<&AbortSignal>) -> Result<()> {
    let Some(signal) = signal else {
        sleep(duration).await;
        return Ok(());
    };

    signal.check()?;

    let timer = std::pin::pin!(sleep(duration));
    let aborted = std::pin::pin!(signal.aborted());
    match select(timer, aborted).await {
        Either::Left(((), _)) => Ok(()),
        Either::Right(((), _)) => Err(error::aborted()),
    }
}

/// Settle `operation` unless `signal` fires first. Abort drops the
/// operation and rejects with the aborted kind.
pub async fn until_aborted<F, T>(operation: F, signal: Option<&AbortSignal>) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let Some(signal) = signal else {
        return operation.await;
    };

    signal.check()?;

    let operation = std::pin::pin!(operation);
    let aborted = std::pin::pin!(signal.aborted());
    match select(operation, aborted).await {
        Either::Left((output, _)) => output,
        Either::Right(((), _)) => Err(error::aborted()),
    }
}

/// Settle `operation` or fail with the timeout kind after `duration`.
///
/// Whichever branch loses is dropped, so a timed-out operation releases its
/// resources and a completed one disarms the timer.
pub async fn race_with_timeout<F>(operation: F, duration: Duration) -> Result<F::Output>
where
    F: Future,
{
    let operation = std::pin::pin!(operation);
    let timer = std::pin::pin!(sleep(duration));
    match select(operation, timer).await {
        Either::Left((output, _)) => Ok(output),
        Either::Right(((), _)) => {
            tracing::debug!(target: "wireline::runtime", ?duration, "operation timed out");
            Err(error::timeout(duration))
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::scheduling::abort::AbortController;
    use crate::scheduling::timer::Instant;

    #[tokio::test(start_paused = true)]
    async fn delay_waits_for_full_duration() {
        let start = Instant::now();
        delay(Duration::from_millis(250), None).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_delay_rejects_and_never_resolves() {
        let controller = AbortController::new();
        let signal = controller.signal();
        let task = tokio::spawn(async move { delay(Duration::from_secs(60), Some(&signal)).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        controller.abort();

        let err = task.await.unwrap().unwrap_err();
        assert!(err.is_aborted());
    }

    #[tokio::test(start_paused = true)]
    async fn pre_aborted_signal_rejects_immediately() {
        let start = Instant::now();
        let signal = crate::scheduling::AbortSignal::aborted_signal();
        let err = delay(Duration::from_secs(5), Some(&signal)).await.unwrap_err();
        assert!(err.is_aborted());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn race_returns_fast_operation() {
        let value = race_with_timeout(async { 7 }, Duration::from_secs(1)).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn race_times_out_slow_operation() {
        let slow = tokio::time::sleep(Duration::from_secs(10));
        let err = race_with_timeout(slow, Duration::from_millis(100)).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn until_aborted_drops_pending_operation() {
        let controller = AbortController::new();
        let signal = controller.signal();
        let pending = until_aborted(
            async {
                sleep(Duration::from_secs(60)).await;
                Ok::<_, crate::Error>(1)
            },
            Some(&signal),
        );
        tokio::spawn(async move {
            sleep(Duration::from_millis(5)).await;
            controller.abort();
        });
        assert!(pending.await.unwrap_err().is_aborted());
        assert_eq!(until_aborted(async { Ok::<_, crate::Error>(2) }, None).await.unwrap(), 2);
    }
}
