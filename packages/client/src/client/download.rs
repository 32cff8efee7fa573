//! Streamed file downloads

use super::execute::parse_json;
use super::HttpClient;
use crate::error::{self, Result};
use crate::http::file_stream::{is_opaque_binary, FileMetadata, FileStreamResponse};
use crate::http::request::{RequestOptions, ResponseMode};
use crate::http::response::ResponseBody;

impl HttpClient {
    /// Request `target` and stream the body when it is an opaque file.
    ///
    /// Responses whose content type is one of
    /// [`OPAQUE_BINARY_TYPES`](crate::http::file_stream::OPAQUE_BINARY_TYPES)
    /// come back as an unread stream with [`FileMetadata`]. Anything else is
    /// read and parsed as JSON, falling back to text.
    pub async fn request_file_stream(&self, target: &str, options: RequestOptions) -> Result<FileStreamResponse> {
        let envelope = self
            .request(target, options.response_mode(ResponseMode::Stream))
            .await?;
        let status_text = envelope.status_text().to_owned();
        let (parts, body) = envelope.into_parts();
        let ResponseBody::Stream(stream) = body else {
            return Err(error::decode("expected an unread response body"));
        };

        if is_opaque_binary(&parts.headers) {
            let metadata = FileMetadata::from_headers(&parts.headers);
            tracing::debug!(
                target: "wireline::http",
                filename = ?metadata.filename,
                size = ?metadata.size,
                "streaming file response"
            );
            return Ok(FileStreamResponse {
                data: None,
                file_stream: Some(stream),
                file_metadata: Some(metadata),
                status: parts.status,
                status_text,
                headers: parts.headers,
            });
        }

        let bytes = self.read_body(stream).await?;
        let data = match parse_json(&bytes) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned()),
        };
        Ok(FileStreamResponse {
            data: Some(data),
            file_stream: None,
            file_metadata: None,
            status: parts.status,
            status_text,
            headers: parts.headers,
        })
    }
}
