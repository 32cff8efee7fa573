//! Client and duplex configuration

pub mod client;
pub mod duplex;
pub mod validation;

pub use client::ClientConfig;
pub use duplex::DuplexConfig;
pub use validation::{ConfigDefaults, ConfigValidator, ConfigurationError};
