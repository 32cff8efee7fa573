//! Configuration validation helpers

use std::time::Duration;

/// Configuration validation result type
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Configuration error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("invalid timeout value: {0}")]
    InvalidTimeout(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid configuration parameter: {0}")]
    InvalidParameter(String),
}

impl From<ConfigurationError> for crate::Error {
    fn from(error: ConfigurationError) -> Self {
        crate::error::builder(error)
    }
}

/// Common configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Rejects zero and anything above one hour.
    pub fn validate_timeout(timeout: Duration, name: &str) -> ConfigResult<()> {
        if timeout.is_zero() {
            return Err(ConfigurationError::InvalidTimeout(format!("{name} cannot be zero")));
        }

        if timeout.as_secs() > 3600 {
            return Err(ConfigurationError::InvalidTimeout(format!("{name} cannot exceed 1 hour")));
        }

        Ok(())
    }

    pub fn validate_optional_timeout(timeout: Option<Duration>, name: &str) -> ConfigResult<()> {
        timeout.map_or(Ok(()), |t| Self::validate_timeout(t, name))
    }

    pub fn validate_non_empty(value: &str, name: &str) -> ConfigResult<()> {
        if value.trim().is_empty() {
            return Err(ConfigurationError::InvalidParameter(format!("{name} cannot be empty")));
        }
        Ok(())
    }

    /// Accepts only URLs whose scheme is one of `schemes`.
    pub fn validate_url(url: &str, schemes: &[&str], name: &str) -> ConfigResult<url::Url> {
        let parsed = url::Url::parse(url)
            .map_err(|e| ConfigurationError::InvalidAddress(format!("{name} {url:?}: {e}")))?;
        if !schemes.contains(&parsed.scheme()) {
            return Err(ConfigurationError::InvalidAddress(format!(
                "{name} scheme must be one of {schemes:?}, got {:?}",
                parsed.scheme()
            )));
        }
        Ok(parsed)
    }
}

/// Common configuration defaults
pub struct ConfigDefaults;

impl ConfigDefaults {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    /// How long a closing duplex connection waits for the peer's close frame
    pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_USER_AGENT: &'static str = concat!("wireline/", env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_must_be_positive_and_bounded() {
        assert!(ConfigValidator::validate_timeout(Duration::from_secs(1), "t").is_ok());
        assert!(matches!(
            ConfigValidator::validate_timeout(Duration::ZERO, "t"),
            Err(ConfigurationError::InvalidTimeout(_))
        ));
        assert!(ConfigValidator::validate_timeout(Duration::from_secs(7200), "t").is_err());
        assert!(ConfigValidator::validate_optional_timeout(None, "t").is_ok());
    }

    #[test]
    fn url_scheme_is_checked() {
        assert!(ConfigValidator::validate_url("ws://localhost:1/x", &["ws", "wss"], "url").is_ok());
        assert!(ConfigValidator::validate_url("http://localhost", &["ws", "wss"], "url").is_err());
        assert!(ConfigValidator::validate_url("not a url", &["ws"], "url").is_err());
    }
}
