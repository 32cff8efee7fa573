//! Cancellation tokens
//!
//! `AbortController` owns the right to cancel; any number of cloned
//! [`AbortSignal`]s observe it. Aborting is sticky and idempotent.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

use crate::error::{self, Result};

/// Cancels every operation holding one of its signals.
#[derive(Clone, Default)]
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal observed by operations cancelled through this controller.
    #[must_use]
    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    pub fn abort(&self) {
        if !self.signal.inner.aborted.swap(true, Ordering::AcqRel) {
            tracing::debug!(target: "wireline::runtime", "abort signalled");
            self.signal.inner.notify.notify_waiters();
        }
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.signal.is_aborted()
    }
}

impl fmt::Debug for AbortController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortController")
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

/// Read side of an [`AbortController`].
#[derive(Clone, Default)]
pub struct AbortSignal {
    inner: Arc<SignalInner>,
}

#[derive(Default)]
struct SignalInner {
    aborted: AtomicBool,
    notify: Notify,
}

impl AbortSignal {
    /// A signal that is already aborted.
    #[must_use]
    pub fn aborted_signal() -> Self {
        let controller = AbortController::new();
        controller.abort();
        controller.signal()
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.load(Ordering::Acquire)
    }

    /// `Err` with the aborted kind once the signal has fired.
    pub fn check(&self) -> Result<()> {
        if self.is_aborted() {
            Err(error::aborted())
        } else {
            Ok(())
        }
    }

    /// Resolves once the signal fires. Resolves immediately if it already has.
    pub async fn aborted(&self) {
        loop {
            let notified = self.inner.notify.notified();
            let mut notified = std::pin::pin!(notified);
            notified.as_mut().enable();

            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }
}

impl fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortSignal")
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn abort_wakes_every_waiter() {
        let controller = AbortController::new();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let signal = controller.signal();
                tokio::spawn(async move { signal.aborted().await })
            })
            .collect();

        tokio::task::yield_now().await;
        controller.abort();

        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .unwrap()
                .unwrap();
        }
    }

    #[tokio::test]
    async fn already_aborted_signal_resolves_immediately() {
        let signal = AbortSignal::aborted_signal();
        signal.aborted().await;
        assert!(signal.check().unwrap_err().is_aborted());
    }

    #[test]
    fn abort_is_idempotent() {
        let controller = AbortController::new();
        let signal = controller.signal();
        assert!(signal.check().is_ok());
        controller.abort();
        controller.abort();
        assert!(signal.is_aborted());
        assert!(controller.is_aborted());
    }
}
