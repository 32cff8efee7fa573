//! Streamed file downloads

use std::fmt;

use http::header::{HeaderMap, CONTENT_DISPOSITION};
use http::StatusCode;

use super::headers::{content_length, media_type};
use super::response::ResponseBody;
use crate::binary::ByteStream;

/// Content types treated as opaque files and handed over as streams.
pub const OPAQUE_BINARY_TYPES: [&str; 8] = [
    "application/octet-stream",
    "application/zip",
    "application/x-zip-compressed",
    "application/gzip",
    "application/x-gzip",
    "application/x-tar",
    "application/x-7z-compressed",
    "application/x-rar-compressed",
];

/// What the response headers say about a downloaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetadata {
    /// From `content-disposition`, `filename*` preferred over `filename`
    pub filename: Option<String>,
    pub content_type: Option<String>,
    /// Declared `content-length`
    pub size: Option<u64>,
}

impl FileMetadata {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        FileMetadata {
            filename: headers
                .get(CONTENT_DISPOSITION)
                .and_then(|value| value.to_str().ok())
                .and_then(disposition_filename),
            content_type: media_type(headers),
            size: content_length(headers),
        }
    }
}

/// Result of `request_file_stream`.
///
/// Exactly one of `file_stream` and `data` is set: opaque binary responses
/// come back as a stream with metadata, anything else is read and parsed.
pub struct FileStreamResponse {
    /// Parsed body (JSON, else text) for non-file responses
    pub data: Option<ResponseBody>,
    pub file_stream: Option<ByteStream>,
    pub file_metadata: Option<FileMetadata>,
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
}

impl FileStreamResponse {
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.file_stream.is_some()
    }
}

impl fmt::Debug for FileStreamResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStreamResponse")
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .field("file_metadata", &self.file_metadata)
            .field("data", &self.data)
            .field("streaming", &self.file_stream.is_some())
            .finish()
    }
}

/// Whether a response with `headers` should be streamed as a file.
#[must_use]
pub fn is_opaque_binary(headers: &HeaderMap) -> bool {
    media_type(headers).is_some_and(|essence| OPAQUE_BINARY_TYPES.contains(&essence.as_str()))
}

/// Filename from a `content-disposition` value.
///
/// `filename*=charset'lang'pct-encoded` wins over a plain `filename=`.
#[must_use]
pub fn disposition_filename(value: &str) -> Option<String> {
    let mut plain = None;
    for param in value.split(';').skip(1) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let raw = raw.trim();
        match key.as_str() {
            "filename*" => {
                let encoded = raw.splitn(3, '\'').nth(2).unwrap_or(raw);
                if let Ok(decoded) = urlencoding::decode(encoded.trim_matches('"')) {
                    if !decoded.is_empty() {
                        return Some(decoded.into_owned());
                    }
                }
            }
            "filename" => {
                let unquoted = raw.trim_matches('"');
                if !unquoted.is_empty() {
                    plain = Some(unquoted.to_owned());
                }
            }
            _ => {}
        }
    }
    plain
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn plain_filename() {
        assert_eq!(
            disposition_filename("attachment; filename=\"report.pdf\"").as_deref(),
            Some("report.pdf")
        );
        assert_eq!(disposition_filename("attachment; filename=a.zip").as_deref(), Some("a.zip"));
    }

    #[test]
    fn extended_filename_wins() {
        let value = "attachment; filename=\"fallback.txt\"; filename*=UTF-8''na%C3%AFve%20file.txt";
        assert_eq!(disposition_filename(value).as_deref(), Some("naïve file.txt"));
    }

    #[test]
    fn missing_filename_is_none() {
        assert_eq!(disposition_filename("inline"), None);
        assert_eq!(disposition_filename("attachment; size=3"), None);
    }

    #[test]
    fn opaque_types_are_detected() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/zip"));
        assert!(is_opaque_binary(&headers));
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        assert!(!is_opaque_binary(&headers));
        headers.remove("content-type");
        assert!(!is_opaque_binary(&headers));
    }

    #[test]
    fn metadata_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/gzip"));
        headers.insert("content-length", HeaderValue::from_static("1234"));
        headers.insert(
            CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment; filename=\"logs.tar.gz\""),
        );
        assert_eq!(
            FileMetadata::from_headers(&headers),
            FileMetadata {
                filename: Some("logs.tar.gz".into()),
                content_type: Some("application/gzip".into()),
                size: Some(1234),
            }
        );
    }
}
