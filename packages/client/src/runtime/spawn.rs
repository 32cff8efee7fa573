//! Task spawning seam
//!
//! Background work (socket pumps, debounce timers, interval producers) goes
//! through [`spawn`], which maps onto `tokio::spawn` on servers and
//! `wasm_bindgen_futures::spawn_local` in the browser.

use std::future::Future;

/// `Send` on server targets, no bound on wasm where everything is single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + ?Sized> MaybeSend for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSend {}
#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSend for T {}

/// `Sync` on server targets, no bound on wasm.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSync: Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Sync + ?Sized> MaybeSync for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSync {}
#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSync for T {}

/// Run `future` in the background on the ambient executor.
///
/// On server targets this requires a Tokio runtime; without one the task is
/// dropped and an error is logged.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(future);
        }
        Err(e) => {
            tracing::error!(
                target: "wireline::runtime",
                error = %e,
                "no Tokio runtime available, background task dropped"
            );
        }
    }
}

/// Run `future` in the background on the ambient executor.
#[cfg(target_arch = "wasm32")]
pub fn spawn<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}
