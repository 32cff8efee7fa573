use std::fmt;
use std::time::Duration;

/// A marker type to indicate that a deadline elapsed.
#[derive(Debug)]
pub struct TimedOut(pub Duration);

impl fmt::Display for TimedOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timed out after {:?}", self.0)
    }
}

impl std::error::Error for TimedOut {}

/// A marker type to indicate that an operation was aborted.
#[derive(Debug)]
pub struct Aborted;

impl fmt::Display for Aborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("aborted by signal")
    }
}

impl std::error::Error for Aborted {}

/// A marker type to indicate that no peer is open.
#[derive(Debug)]
pub struct NotConnected;

impl fmt::Display for NotConnected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("peer is not open")
    }
}

impl std::error::Error for NotConnected {}

/// A marker type to indicate that neither a native nor a library duplex
/// transport exists in the current environment.
#[derive(Debug)]
pub struct NoTransport;

impl fmt::Display for NoTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("environment exposes no duplex transport")
    }
}

impl std::error::Error for NoTransport {}

/// Stringified JavaScript exception. `JsValue` is neither `Send` nor `Sync`,
/// so only its rendering is kept.
#[cfg(target_arch = "wasm32")]
#[derive(Debug)]
pub struct JsFailure(pub String);

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for JsFailure {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        match value.as_string() {
            Some(message) => JsFailure(message),
            None => JsFailure(format!("{value:?}")),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl fmt::Display for JsFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JavaScript error: {}", self.0)
    }
}

#[cfg(target_arch = "wasm32")]
impl std::error::Error for JsFailure {}
