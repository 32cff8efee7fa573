//! Default request headers

use http::header::{HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};

use crate::builder::core::HttpBuilder;

/// Header constants for common HTTP headers
pub mod header {
    pub use http::header::*;

    /// Custom X-API-Key header for API authentication
    pub const X_API_KEY: &str = "x-api-key";
}

impl HttpBuilder {
    /// Send `key: value` with every request. Invalid names or values are
    /// reported by `build`.
    ///
    /// # Examples
    /// ```no_run
    /// # fn run() -> wireline::Result<()> {
    /// let client = wireline::http()
    ///     .header("x-api-version", "2024-01")
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.inner = self.inner.header(key, value);
        self
    }

    /// Add several headers; later entries replace earlier ones with the
    /// same name.
    #[must_use]
    pub fn headers<'a>(self, headers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        headers
            .into_iter()
            .fold(self, |builder, (key, value)| builder.header(key, value))
    }

    #[must_use]
    pub fn accept(self, media_type: &str) -> Self {
        self.header(ACCEPT, media_type)
    }

    /// Default `content-type` for bodies that do not set their own.
    #[must_use]
    pub fn content_type(self, media_type: &str) -> Self {
        self.header(CONTENT_TYPE, media_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_land_in_config() {
        let client = HttpBuilder::new()
            .headers([("x-one", "1"), ("x-two", "2")])
            .accept("application/json")
            .build()
            .unwrap();
        let headers = &client.config().headers;
        assert_eq!(headers["x-one"], "1");
        assert_eq!(headers["x-two"], "2");
        assert_eq!(headers[ACCEPT], "application/json");
    }

    #[test]
    fn test_invalid_header_fails_build() {
        let err = HttpBuilder::new().header("bad header", "x").build().unwrap_err();
        assert!(err.is_builder());
    }
}
