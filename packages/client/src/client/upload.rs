//! Multipart uploads
//!
//! `upload_files` builds an in-memory form and goes through the regular
//! pipeline, retries included. `stream_upload` feeds every file through a
//! [`ProgressTracker`] and sends the form as a one-shot stream, so it is
//! never retried.

use std::fmt;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::Method;

use super::HttpClient;
use crate::binary::{boxed, chunked, ByteStream};
use crate::error::{self, Result};
use crate::http::multipart::{FieldValue, FileData, FilePart, Form, FormBody};
use crate::http::progress::{ProgressCallback, ProgressTracker};
use crate::http::request::RequestOptions;
use crate::http::response::ResponseEnvelope;

/// Default size of the chunks reported by [`HttpClient::stream_upload`].
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Options for [`HttpClient::stream_upload`].
pub struct StreamUploadOptions {
    /// Upper bound on the bytes reported per `uploading` event
    pub chunk_size: usize,
    pub on_progress: Option<ProgressCallback>,
    /// Method, headers, timeout and signal of the upload request
    pub options: RequestOptions,
}

impl Default for StreamUploadOptions {
    fn default() -> Self {
        StreamUploadOptions {
            chunk_size: DEFAULT_CHUNK_SIZE,
            on_progress: None,
            options: RequestOptions::post(),
        }
    }
}

impl StreamUploadOptions {
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(crate::http::UploadProgress) + Send + Sync + 'static,
    {
        self.on_progress = Some(std::sync::Arc::new(callback));
        self
    }

    #[must_use]
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

impl fmt::Debug for StreamUploadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamUploadOptions")
            .field("chunk_size", &self.chunk_size)
            .field("on_progress", &self.on_progress.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl HttpClient {
    /// Upload named files plus form fields as `multipart/form-data`.
    ///
    /// Fields come first, in order; list values repeat the field name. A
    /// `GET` in `options` is sent as `POST`.
    pub async fn upload_files<K, V>(
        &self,
        target: &str,
        files: Vec<FilePart>,
        fields: impl IntoIterator<Item = (K, V)>,
        options: RequestOptions,
    ) -> Result<ResponseEnvelope>
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let form = files.into_iter().fold(build_fields(fields), Form::file);
        tracing::debug!(
            target: "wireline::http",
            parts = form.part_count(),
            files = form.file_count(),
            "uploading form"
        );
        self.request(target, upload_method(options).multipart(form)).await
    }

    /// Upload files as a stream, reporting progress.
    ///
    /// Events arrive as `preparing`, then one `uploading` event per chunk of
    /// at most `chunk_size` bytes, then `processing` once the body is sent.
    /// Every call ends with exactly one `completed` event, whether the upload
    /// succeeded or failed, and even when `files` is empty.
    pub async fn stream_upload<K, V>(
        &self,
        target: &str,
        files: Vec<FilePart>,
        fields: impl IntoIterator<Item = (K, V)>,
        upload: StreamUploadOptions,
    ) -> Result<ResponseEnvelope>
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let StreamUploadOptions {
            chunk_size,
            on_progress,
            options,
        } = upload;

        let total = files.iter().map(|file| file.data.len()).sum::<Option<u64>>();
        let tracker = ProgressTracker::new(on_progress, total);
        tracker.preparing();

        let result = self
            .send_tracked(target, files, fields, chunk_size, options, &tracker)
            .await;
        if let Err(e) = &result {
            tracing::debug!(
                target: "wireline::http",
                error = %e,
                uploaded = tracker.uploaded(),
                "streamed upload failed"
            );
        }
        tracker.completed();
        result
    }

    async fn send_tracked<K, V>(
        &self,
        target: &str,
        files: Vec<FilePart>,
        fields: impl IntoIterator<Item = (K, V)>,
        chunk_size: usize,
        options: RequestOptions,
        tracker: &ProgressTracker,
    ) -> Result<ResponseEnvelope>
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        if chunk_size == 0 {
            return Err(error::builder("chunk_size must be greater than zero"));
        }

        let form = files.into_iter().fold(build_fields(fields), |form, file| {
            form.file(tracked_part(tracker, file, chunk_size))
        });
        let content_type = HeaderValue::from_str(&form.content_type()).map_err(error::builder)?;
        let (body, length) = match form.into_body() {
            FormBody::Full(bytes) => (chunked(bytes, chunk_size), None),
            FormBody::Stream { stream, length } => (stream, length),
        };

        let sent = tracker.clone();
        let on_drained = stream::once(async move {
            sent.processing();
            None::<Result<Bytes>>
        })
        .filter_map(futures::future::ready);
        let body = boxed(body.chain(on_drained));

        let mut options = upload_method(options);
        options.headers.insert(CONTENT_TYPE, content_type);
        let response = self.request(target, options.stream(body, length)).await?;

        tracker.processing();
        Ok(response)
    }
}

fn build_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Form
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fields
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.field(name, value))
}

fn upload_method(options: RequestOptions) -> RequestOptions {
    if options.method == Method::GET {
        options.method(Method::POST)
    } else {
        options
    }
}

/// Turn `file` into a streamed part whose chunks advance `tracker`.
fn tracked_part(tracker: &ProgressTracker, file: FilePart, chunk_size: usize) -> FilePart {
    let label = file.label().to_owned();
    let FilePart {
        name,
        data,
        filename,
        content_type,
    } = file;

    let length = data.len();
    let (source, default_type): (ByteStream, Option<&str>) = match data {
        FileData::Bytes(bytes) => (chunked(bytes, chunk_size), None),
        FileData::Text(text) => (chunked(text, chunk_size), Some("text/plain; charset=utf-8")),
        FileData::Stream { stream, .. } => (stream, None),
    };

    let mut part = FilePart::stream(name, tracker.track(label, source, chunk_size), length);
    part.filename = filename;
    part.content_type = content_type.or_else(|| default_type.map(str::to_owned));
    part
}
