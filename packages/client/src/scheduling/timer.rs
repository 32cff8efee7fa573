//! Timer primitives
//!
//! Dropping a pending [`sleep`] releases the underlying timer: the Tokio
//! timer entry on servers, the `setTimeout` handle in the browser.

use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::time::Instant;

#[cfg(target_arch = "wasm32")]
pub use self::web::Instant;

/// Suspend for `duration`.
#[cfg(not(target_arch = "wasm32"))]
pub fn sleep(duration: Duration) -> tokio::time::Sleep {
    tokio::time::sleep(duration)
}

/// Suspend for `duration`.
#[cfg(target_arch = "wasm32")]
pub fn sleep(duration: Duration) -> web::Sleep {
    web::Sleep::new(duration)
}

#[cfg(target_arch = "wasm32")]
mod web {
    use std::future::Future;
    use std::ops::{Add, Sub};
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    fn set_timeout(callback: &js_sys::Function, millis: i32) -> Option<i32> {
        let global = js_sys::global();
        if let Some(window) = global.dyn_ref::<web_sys::Window>() {
            return window
                .set_timeout_with_callback_and_timeout_and_arguments_0(callback, millis)
                .ok();
        }
        global
            .dyn_ref::<web_sys::WorkerGlobalScope>()?
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback, millis)
            .ok()
    }

    fn clear_timeout(handle: i32) {
        let global = js_sys::global();
        if let Some(window) = global.dyn_ref::<web_sys::Window>() {
            window.clear_timeout_with_handle(handle);
        } else if let Some(worker) = global.dyn_ref::<web_sys::WorkerGlobalScope>() {
            worker.clear_timeout_with_handle(handle);
        }
    }

    /// `setTimeout` wrapped as a future; clears the timeout when dropped.
    pub struct Sleep {
        future: JsFuture,
        handle: Option<i32>,
    }

    impl Sleep {
        pub(super) fn new(duration: Duration) -> Self {
            let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
            let mut handle = None;
            let promise = js_sys::Promise::new(&mut |resolve, _reject| {
                handle = set_timeout(&resolve, millis);
                if handle.is_none() {
                    let _ = resolve.call0(&JsValue::NULL);
                }
            });
            Sleep {
                future: JsFuture::from(promise),
                handle,
            }
        }
    }

    impl Future for Sleep {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            match Pin::new(&mut self.future).poll(cx) {
                Poll::Ready(_) => {
                    self.handle = None;
                    Poll::Ready(())
                }
                Poll::Pending => Poll::Pending,
            }
        }
    }

    impl Drop for Sleep {
        fn drop(&mut self) {
            if let Some(handle) = self.handle.take() {
                clear_timeout(handle);
            }
        }
    }

    /// Monotonic instant backed by `performance.now()`, falling back to
    /// `Date.now()` where no performance clock exists.
    #[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
    pub struct Instant(f64);

    impl Instant {
        #[must_use]
        pub fn now() -> Self {
            let global = js_sys::global();
            let performance = js_sys::Reflect::get(&global, &JsValue::from_str("performance"))
                .ok()
                .and_then(|value| value.dyn_into::<web_sys::Performance>().ok());
            Instant(performance.map_or_else(js_sys::Date::now, |p| p.now()))
        }

        #[must_use]
        pub fn duration_since(&self, earlier: Instant) -> Duration {
            Duration::from_secs_f64(((self.0 - earlier.0) / 1000.0).max(0.0))
        }

        #[must_use]
        pub fn elapsed(&self) -> Duration {
            Instant::now().duration_since(*self)
        }
    }

    impl Add<Duration> for Instant {
        type Output = Instant;

        fn add(self, rhs: Duration) -> Instant {
            Instant(self.0 + rhs.as_secs_f64() * 1000.0)
        }
    }

    impl Sub<Instant> for Instant {
        type Output = Duration;

        fn sub(self, rhs: Instant) -> Duration {
            self.duration_since(rhs)
        }
    }
}
