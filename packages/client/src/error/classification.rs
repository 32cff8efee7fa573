use http::StatusCode;

use super::types::{Error, Kind};

impl Error {
    /// Returns true if the error came from invalid caller input.
    #[must_use]
    pub fn is_builder(&self) -> bool {
        matches!(self.inner.kind, Kind::Builder)
    }

    /// Returns true if the error is related to decoding text, base64, hex or a body.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self.inner.kind, Kind::Decode)
    }

    /// Returns true if the operation was cancelled through an abort signal.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self.inner.kind, Kind::Aborted)
    }

    /// Returns true if a request or delay deadline elapsed.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.inner.kind, Kind::Timeout)
    }

    /// Returns true if a duplex connection did not open in time.
    #[must_use]
    pub fn is_connection_timeout(&self) -> bool {
        matches!(self.inner.kind, Kind::ConnectionTimeout)
    }

    #[must_use]
    pub fn is_no_transport(&self) -> bool {
        matches!(self.inner.kind, Kind::NoTransport)
    }

    #[must_use]
    pub fn is_not_connected(&self) -> bool {
        matches!(self.inner.kind, Kind::NotConnected)
    }

    /// Returns true for any native transport failure.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self.inner.kind, Kind::Transport { .. })
    }

    /// Returns true if the failure happened while establishing the connection,
    /// before any request bytes reached the peer.
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self.inner.kind, Kind::Transport { connect: true })
    }

    /// Returns true if the error is from a non-2xx response.
    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self.inner.kind, Kind::Status(_))
    }

    /// Returns the status code, if the error was generated from a response.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self.inner.kind {
            Kind::Status(code) => Some(code),
            _ => None,
        }
    }

    /// Structured detail extracted from the response body, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.inner.detail.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error;

    #[test]
    fn status_errors_expose_code_and_detail() {
        let err = error::status(
            StatusCode::UNPROCESSABLE_ENTITY,
            Some("field required".to_string()),
            None,
        );
        assert!(err.is_status());
        assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
        assert_eq!(err.detail(), Some("field required"));
        assert_eq!(
            err.to_string(),
            "HTTP status client error (422 Unprocessable Entity): field required"
        );
    }

    #[test]
    fn connect_failures_are_transport_errors() {
        let err = error::connect(std::io::Error::from(std::io::ErrorKind::ConnectionRefused));
        assert!(err.is_transport());
        assert!(err.is_connect());
        assert!(err.status().is_none());
    }

    #[test]
    fn clones_keep_the_source() {
        use std::error::Error as _;
        let err = error::transport(std::io::Error::other("reset"));
        let cloned = err.clone();
        assert_eq!(cloned.source().map(ToString::to_string), Some("reset".to_string()));
    }
}
