//! Authentication methods
//!
//! Credentials are sent as default headers on every request and are marked
//! sensitive so they stay out of debug output.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::{HeaderValue, AUTHORIZATION};

use crate::builder::core::HttpBuilder;
use crate::builder::headers::header;

impl HttpBuilder {
    /// Set the `X-API-Key` header.
    #[must_use]
    pub fn api_key(self, key: &str) -> Self {
        self.sensitive(header::X_API_KEY, key.to_owned())
    }

    /// Basic authentication with `user` and `password`.
    ///
    /// # Examples
    /// ```no_run
    /// # fn run() -> wireline::Result<()> {
    /// let client = wireline::http()
    ///     .basic_auth("admin", "secret")
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn basic_auth(self, user: &str, password: &str) -> Self {
        let encoded = STANDARD.encode(format!("{user}:{password}"));
        self.sensitive(AUTHORIZATION.as_str(), format!("Basic {encoded}"))
    }

    /// Bearer token authentication for OAuth2 and similar schemes.
    #[must_use]
    pub fn bearer_auth(mut self, token: &str) -> Self {
        self.inner = self.inner.bearer_auth(token);
        self
    }

    fn sensitive(self, name: &'static str, value: String) -> Self {
        match HeaderValue::try_from(value) {
            Ok(mut value) => {
                value.set_sensitive(true);
                self.header(name, value)
            }
            // Let the client builder report the invalid value.
            Err(_) => self.header(name, "\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_is_base64() {
        let client = HttpBuilder::new().basic_auth("user", "pass").build().unwrap();
        let value = &client.config().headers[AUTHORIZATION];
        assert_eq!(value, "Basic dXNlcjpwYXNz");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_bearer_and_api_key() {
        let client = HttpBuilder::new().bearer_auth("tok").api_key("k-1").build().unwrap();
        let headers = &client.config().headers;
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
        assert_eq!(headers[header::X_API_KEY], "k-1");
    }

    #[test]
    fn test_invalid_api_key_fails_build() {
        assert!(HttpBuilder::new().api_key("bad\nkey").build().unwrap_err().is_builder());
    }
}
