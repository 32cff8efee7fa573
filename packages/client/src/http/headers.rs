//! Header map helpers

use http::header::{self, Entry, HeaderMap, HeaderName, HeaderValue};

pub(crate) fn application_json() -> HeaderValue {
    HeaderValue::from_static("application/json")
}

pub(crate) fn text_plain() -> HeaderValue {
    HeaderValue::from_static("text/plain; charset=utf-8")
}

pub(crate) fn octet_stream() -> HeaderValue {
    HeaderValue::from_static("application/octet-stream")
}

/// Merge `src` into `dst`. Every name present in `src` replaces all of its
/// values in `dst`; repeated names in `src` are kept in order.
pub fn replace_headers(dst: &mut HeaderMap, src: HeaderMap) {
    let mut prev_name: Option<HeaderName> = None;
    for (key, value) in src {
        match key {
            Some(key) => match dst.entry(key.clone()) {
                Entry::Occupied(mut entry) => {
                    entry.insert(value);
                    prev_name = Some(key);
                }
                Entry::Vacant(entry) => {
                    entry.insert(value);
                    prev_name = Some(key);
                }
            },
            None => {
                if let Some(ref name) = prev_name {
                    dst.append(name.clone(), value);
                }
            }
        }
    }
}

/// Set `content-type` unless the caller already chose one.
pub(crate) fn default_content_type(headers: &mut HeaderMap, value: HeaderValue) {
    headers.entry(header::CONTENT_TYPE).or_insert(value);
}

/// Media type of `content-type` without parameters, lowercased.
#[must_use]
pub fn media_type(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let essence = value.split(';').next()?.trim();
    (!essence.is_empty()).then(|| essence.to_ascii_lowercase())
}

/// `content-length` as a number, if present and valid.
#[must_use]
pub fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_keeps_repeated_source_values() {
        let mut dst = HeaderMap::new();
        dst.insert("x-a", HeaderValue::from_static("old"));
        dst.insert("x-b", HeaderValue::from_static("kept"));

        let mut src = HeaderMap::new();
        src.append("x-a", HeaderValue::from_static("1"));
        src.append("x-a", HeaderValue::from_static("2"));

        replace_headers(&mut dst, src);
        let values: Vec<_> = dst.get_all("x-a").iter().collect();
        assert_eq!(values, vec!["1", "2"]);
        assert_eq!(dst.get("x-b").unwrap(), "kept");
    }

    #[test]
    fn media_type_strips_parameters() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("Application/JSON; charset=utf-8"));
        assert_eq!(media_type(&headers).as_deref(), Some("application/json"));
    }

    #[test]
    fn default_content_type_respects_caller() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
        default_content_type(&mut headers, application_json());
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/csv");
    }
}
