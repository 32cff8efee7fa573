pub mod classification;
pub mod constructors;
pub mod conversions;
pub mod detail;
pub mod helpers;
pub mod types;

pub use constructors::*;
pub use detail::extract_detail;
pub use helpers::{Aborted, NoTransport, NotConnected, TimedOut};
#[cfg(target_arch = "wasm32")]
pub use helpers::JsFailure;
pub use types::{Error, Kind, Result};

pub(crate) use types::BoxError;
