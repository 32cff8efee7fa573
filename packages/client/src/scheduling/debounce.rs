//! Call-rate limiting
//!
//! Both wrappers run the wrapped function on a background task through
//! [`crate::runtime::spawn`], so they need an ambient executor.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::{abortable, AbortHandle};

use super::timer::{sleep, Instant};
use crate::runtime::{spawn, MaybeSend, MaybeSync};

/// Wrap `f` so that it runs only once `wait` has passed without another call.
///
/// Every call re-arms the timer and aborts the previously armed one; the last
/// arguments win.
pub fn debounce<F, A>(f: F, wait: Duration) -> Debounced<F, A>
where
    F: Fn(A) + MaybeSend + MaybeSync + 'static,
    A: MaybeSend + 'static,
{
    Debounced {
        f: Arc::new(f),
        wait,
        pending: Arc::new(Mutex::new(Pending::default())),
        _args: std::marker::PhantomData,
    }
}

/// Handle returned by [`debounce`].
pub struct Debounced<F, A> {
    f: Arc<F>,
    wait: Duration,
    pending: Arc<Mutex<Pending>>,
    _args: std::marker::PhantomData<fn(A)>,
}

/// Armed timer of a [`Debounced`], tagged with the call that armed it.
#[derive(Default)]
struct Pending {
    generation: u64,
    handle: Option<AbortHandle>,
}

impl Pending {
    fn arm(&mut self, handle: AbortHandle) -> u64 {
        self.generation += 1;
        if let Some(previous) = self.handle.replace(handle) {
            previous.abort();
        }
        self.generation
    }

    /// Whether the timer armed as `generation` may fire. Clears the slot only
    /// when it still holds that timer.
    fn claim(&mut self, generation: u64) -> bool {
        if self.generation != generation || self.handle.is_none() {
            return false;
        }
        self.handle = None;
        true
    }
}

impl<F, A> Debounced<F, A>
where
    F: Fn(A) + MaybeSend + MaybeSync + 'static,
    A: MaybeSend + 'static,
{
    pub fn call(&self, args: A) {
        let f = Arc::clone(&self.f);
        let wait = self.wait;
        let pending = Arc::clone(&self.pending);
        let (task, handle) = abortable(async move { sleep(wait).await });

        let generation = self.lock().arm(handle);
        spawn(async move {
            if task.await.is_err() {
                return;
            }
            let claimed = pending.lock().unwrap_or_else(PoisonError::into_inner).claim(generation);
            if claimed {
                f(args);
            }
        });
    }

    /// Drop the pending invocation, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self.lock().handle.take() {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.lock().handle.is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Wrap `f` so that it runs at most once per `window`.
///
/// A call inside the window is deferred to the window boundary instead of
/// being dropped. If several calls land in the same window only the latest
/// arguments are used.
pub fn throttle<F, A>(f: F, window: Duration) -> Throttled<F, A>
where
    F: Fn(A) + MaybeSend + MaybeSync + 'static,
    A: MaybeSend + 'static,
{
    Throttled {
        f: Arc::new(f),
        window,
        state: Arc::new(Mutex::new(ThrottleState {
            last_run: None,
            deferred: None,
            armed: false,
        })),
    }
}

/// Handle returned by [`throttle`].
pub struct Throttled<F, A> {
    f: Arc<F>,
    window: Duration,
    state: Arc<Mutex<ThrottleState<A>>>,
}

struct ThrottleState<A> {
    last_run: Option<Instant>,
    deferred: Option<A>,
    armed: bool,
}

impl<F, A> Throttled<F, A>
where
    F: Fn(A) + MaybeSend + MaybeSync + 'static,
    A: MaybeSend + 'static,
{
    pub fn call(&self, args: A) {
        let now = Instant::now();
        let wait = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.armed {
                state.deferred = Some(args);
                return;
            }

            match state.last_run {
                Some(last) if now.duration_since(last) < self.window => {
                    state.deferred = Some(args);
                    state.armed = true;
                    self.window - now.duration_since(last)
                }
                _ => {
                    state.last_run = Some(now);
                    drop(state);
                    (self.f)(args);
                    return;
                }
            }
        };

        let f = Arc::clone(&self.f);
        let state = Arc::clone(&self.state);
        spawn(async move {
            sleep(wait).await;
            let deferred = {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                state.armed = false;
                state.last_run = Some(Instant::now());
                state.deferred.take()
            };
            if let Some(args) = deferred {
                f(args);
            }
        });
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |n| sink.lock().unwrap().push(n))
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_runs_once_with_latest_arguments() {
        let (seen, f) = recorder();
        let debounced = debounce(f, Duration::from_millis(100));

        for n in 1..=5 {
            debounced.call(n);
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        assert!(seen.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*seen.lock().unwrap(), vec![5]);
        assert!(!debounced.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_cancel_drops_pending_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let debounced = debounce(move |()| { counter.fetch_add(1, Ordering::SeqCst); }, Duration::from_millis(50));

        debounced.call(());
        debounced.cancel();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn superseded_timer_leaves_newer_one_armed() {
        let mut pending = Pending::default();
        let (first, _) = AbortHandle::new_pair();
        let older = pending.arm(first);
        let (second, _) = AbortHandle::new_pair();
        let newer = pending.arm(second);

        // The older timer woke before its abort landed.
        assert!(!pending.claim(older));
        assert!(pending.handle.is_some());
        assert!(pending.claim(newer));
        assert!(pending.handle.is_none());
        assert!(!pending.claim(newer));
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_defers_to_window_boundary() {
        let (seen, f) = recorder();
        let throttled = throttle(f, Duration::from_millis(100));

        throttled.call(1);
        assert_eq!(*seen.lock().unwrap(), vec![1]);

        tokio::time::sleep(Duration::from_millis(10)).await;
        throttled.call(2);
        throttled.call(3);
        assert_eq!(*seen.lock().unwrap(), vec![1]);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_runs_immediately_after_quiet_window() {
        let (seen, f) = recorder();
        let throttled = throttle(f, Duration::from_millis(100));

        throttled.call(1);
        tokio::time::sleep(Duration::from_millis(150)).await;
        throttled.call(2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }
}
