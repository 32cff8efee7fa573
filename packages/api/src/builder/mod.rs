//! Fluent builders
//!
//! [`HttpBuilder`] configures an HTTP client and [`DuplexBuilder`] a duplex
//! connection. Both defer invalid input to `build`.

pub mod auth;
pub mod core;
pub mod duplex;
pub mod headers;

pub use self::core::HttpBuilder;
pub use duplex::DuplexBuilder;
pub use headers::header;
