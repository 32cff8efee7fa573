//! Capability report types
//!
//! A [`CapabilityReport`] is an immutable snapshot of the transport, stream
//! and crypto primitives the hosting environment exposes.

use serde::Serialize;

/// Environment family the crate is running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeFamily {
    /// Native process (any non-wasm target).
    Server,
    /// Web worker scope.
    Worker,
    /// Browser main thread with a `window` global.
    Browser,
    /// Anything the detector could not classify.
    Unknown,
}

impl RuntimeFamily {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeFamily::Server => "server",
            RuntimeFamily::Worker => "worker",
            RuntimeFamily::Browser => "browser",
            RuntimeFamily::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RuntimeFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Features {
    /// Host-provided duplex socket (`WebSocket` global).
    pub native_socket: bool,
    /// Library-backed duplex socket compiled into this build.
    pub library_socket: bool,
    /// Host request primitive (`fetch`, or the hyper client on servers).
    pub native_request: bool,
    /// Request and response bodies can be streamed.
    pub streaming_body: bool,
    /// Cryptographically secure random source.
    pub secure_random: bool,
    /// Abortable native requests.
    pub abort_signal: bool,
}

impl Features {
    /// Conservative all-false flags.
    #[must_use]
    pub const fn none() -> Self {
        Features {
            native_socket: false,
            library_socket: false,
            native_request: false,
            streaming_body: false,
            secure_random: false,
            abort_signal: false,
        }
    }
}

/// Snapshot of what the current environment supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityReport {
    family: RuntimeFamily,
    version: Option<String>,
    features: Features,
}

impl CapabilityReport {
    #[must_use]
    pub fn new(family: RuntimeFamily, version: Option<String>, features: Features) -> Self {
        Self {
            family,
            version,
            features,
        }
    }

    /// Report for an environment nothing is known about.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(RuntimeFamily::Unknown, None, Features::none())
    }

    #[must_use]
    pub fn family(&self) -> RuntimeFamily {
        self.family
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    #[must_use]
    pub fn features(&self) -> &Features {
        &self.features
    }

    /// True if either duplex transport is available.
    #[must_use]
    pub fn has_duplex_transport(&self) -> bool {
        self.features.native_socket || self.features.library_socket
    }
}
