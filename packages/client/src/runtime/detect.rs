//! Environment probing
//!
//! Detection never fails and performs no I/O. Environments that cannot be
//! classified report [`CapabilityReport::unknown`] so that adapter selection
//! fails explicitly further down.

use super::report::{CapabilityReport, Features, RuntimeFamily};

/// Probe the hosting environment.
#[cfg(not(target_arch = "wasm32"))]
#[must_use]
pub fn detect() -> CapabilityReport {
    let features = Features {
        native_socket: false,
        library_socket: cfg!(feature = "library-transport"),
        native_request: true,
        streaming_body: true,
        secure_random: crate::crypto::random::secure_random_available(),
        abort_signal: true,
    };

    CapabilityReport::new(
        RuntimeFamily::Server,
        Some(format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)),
        features,
    )
}

/// Probe the hosting environment.
#[cfg(target_arch = "wasm32")]
#[must_use]
pub fn detect() -> CapabilityReport {
    use wasm_bindgen::{JsCast, JsValue};

    let global = js_sys::global();
    let has = |name: &str| js_sys::Reflect::has(&global, &JsValue::from_str(name)).unwrap_or(false);

    let family = if global.dyn_ref::<web_sys::Window>().is_some() {
        RuntimeFamily::Browser
    } else if global.dyn_ref::<web_sys::WorkerGlobalScope>().is_some() {
        RuntimeFamily::Worker
    } else {
        return CapabilityReport::unknown();
    };

    let features = Features {
        native_socket: has("WebSocket"),
        library_socket: false,
        native_request: has("fetch"),
        streaming_body: has("ReadableStream"),
        secure_random: has("crypto"),
        abort_signal: has("AbortController"),
    };

    let version = js_sys::Reflect::get(&global, &JsValue::from_str("navigator"))
        .ok()
        .filter(|navigator| !navigator.is_undefined())
        .and_then(|navigator| js_sys::Reflect::get(&navigator, &JsValue::from_str("userAgent")).ok())
        .and_then(|agent| agent.as_string());

    CapabilityReport::new(family, version, features)
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn server_targets_report_library_transport() {
        let report = detect();
        assert_eq!(report.family(), RuntimeFamily::Server);
        assert!(!report.features().native_socket);
        assert_eq!(report.features().library_socket, cfg!(feature = "library-transport"));
        assert!(report.features().native_request);
        assert!(report.version().is_some());
    }

    #[test]
    fn detection_is_repeatable() {
        assert_eq!(detect(), detect());
    }
}
