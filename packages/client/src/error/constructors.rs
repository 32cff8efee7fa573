use std::time::Duration;

use http::StatusCode;

use super::helpers::{Aborted, NoTransport, NotConnected, TimedOut};
use super::types::{BoxError, Error, Kind};

/// Creates an `Error` for invalid caller input.
pub fn builder<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Builder).with(e.into())
}

/// Creates an `Error` for malformed encoded input.
pub fn decode<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Decode).with(e.into())
}

/// Creates an `Error` for a cancelled operation.
pub fn aborted() -> Error {
    Error::new(Kind::Aborted).with(Aborted)
}

/// Creates an `Error` for an elapsed deadline.
pub fn timeout(after: Duration) -> Error {
    Error::new(Kind::Timeout).with(TimedOut(after))
}

/// Creates an `Error` for a duplex connect deadline.
pub fn connection_timeout(after: Duration) -> Error {
    Error::new(Kind::ConnectionTimeout).with(TimedOut(after))
}

/// Creates an `Error` when no duplex transport can be selected.
pub fn no_transport() -> Error {
    Error::new(Kind::NoTransport).with(NoTransport)
}

/// Creates an `Error` for a send without an open peer.
pub fn not_connected() -> Error {
    Error::new(Kind::NotConnected).with(NotConnected)
}

/// Creates an `Error` for a native transport failure after the request left.
pub fn transport<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Transport { connect: false }).with(e.into())
}

/// Creates an `Error` for a failure to establish the connection.
pub fn connect<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Transport { connect: true }).with(e.into())
}

/// Creates an `Error` for a non-2xx response.
pub fn status(status: StatusCode, detail: Option<String>, url: Option<url::Url>) -> Error {
    let mut error = Error::new(Kind::Status(status));
    if let Some(detail) = detail {
        error = error.with_detail(detail);
    }
    if let Some(url) = url {
        error = error.with_url(url);
    }
    error
}

/// Converts a JavaScript exception into a transport error.
#[cfg(target_arch = "wasm32")]
pub(crate) fn js(value: wasm_bindgen::JsValue) -> Error {
    transport(super::helpers::JsFailure::from(value))
}
