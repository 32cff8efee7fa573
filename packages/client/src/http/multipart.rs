//! `multipart/form-data` encoding
//!
//! Each part is written as
//!
//! ```text
//! --{boundary}\r\n
//! Content-Disposition: form-data; name="..."[; filename="..."]\r\n
//! [Content-Type: ...\r\n]
//! \r\n
//! {payload}\r\n
//! ```
//!
//! followed by a closing `--{boundary}--\r\n`. Forms made only of in-memory
//! parts encode to one buffer; a single streamed part turns the whole body
//! into a stream.

use std::fmt;

use bytes::{Bytes, BytesMut};
use futures::stream::{self, StreamExt};

use crate::binary::{boxed, ByteStream};
use crate::crypto::generate_boundary;

/// Payload of a file part.
pub enum FileData {
    Bytes(Bytes),
    Text(String),
    /// Lazily produced payload. `length` enables total-size reporting and a
    /// `content-length` on the request.
    Stream {
        stream: ByteStream,
        length: Option<u64>,
    },
}

impl FileData {
    #[must_use]
    pub fn len(&self) -> Option<u64> {
        match self {
            FileData::Bytes(bytes) => Some(bytes.len() as u64),
            FileData::Text(text) => Some(text.len() as u64),
            FileData::Stream { length, .. } => *length,
        }
    }

    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self, FileData::Stream { .. })
    }
}

impl From<Bytes> for FileData {
    fn from(bytes: Bytes) -> Self {
        FileData::Bytes(bytes)
    }
}

impl From<Vec<u8>> for FileData {
    fn from(bytes: Vec<u8>) -> Self {
        FileData::Bytes(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for FileData {
    fn from(bytes: &'static [u8]) -> Self {
        FileData::Bytes(Bytes::from_static(bytes))
    }
}

impl From<String> for FileData {
    fn from(text: String) -> Self {
        FileData::Text(text)
    }
}

impl From<&str> for FileData {
    fn from(text: &str) -> Self {
        FileData::Text(text.to_owned())
    }
}

impl From<crate::binary::BinaryData> for FileData {
    fn from(data: crate::binary::BinaryData) -> Self {
        FileData::Bytes(data.into_bytes())
    }
}

impl fmt::Debug for FileData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileData::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            FileData::Text(text) => write!(f, "Text({} chars)", text.len()),
            FileData::Stream { length, .. } => f.debug_struct("Stream").field("length", length).finish(),
        }
    }
}

/// One named file in an upload.
#[derive(Debug)]
pub struct FilePart {
    pub name: String,
    pub data: FileData,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl FilePart {
    pub fn new(name: impl Into<String>, data: impl Into<FileData>) -> Self {
        FilePart {
            name: name.into(),
            data: data.into(),
            filename: None,
            content_type: None,
        }
    }

    pub fn stream(name: impl Into<String>, stream: ByteStream, length: Option<u64>) -> Self {
        Self::new(name, FileData::Stream { stream, length })
    }

    #[must_use]
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Label used in progress events: the filename, else the field name.
    #[must_use]
    pub fn label(&self) -> &str {
        self.filename.as_deref().unwrap_or(&self.name)
    }
}

/// Scalar or repeated form field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    /// Appended as one entry per element, in order.
    List(Vec<String>),
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::List(values)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(values: Vec<&str>) -> Self {
        FieldValue::List(values.into_iter().map(str::to_owned).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FieldValue {
    fn from(values: [&str; N]) -> Self {
        FieldValue::List(values.iter().map(|v| (*v).to_owned()).collect())
    }
}

/// A multipart form under construction.
pub struct Form {
    boundary: String,
    parts: Vec<Part>,
}

struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    body: PartBody,
}

enum PartBody {
    Bytes(Bytes),
    Stream {
        stream: ByteStream,
        length: Option<u64>,
    },
}

/// Encoded form body.
pub enum FormBody {
    Full(Bytes),
    Stream {
        stream: ByteStream,
        length: Option<u64>,
    },
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    #[must_use]
    pub fn new() -> Self {
        Form {
            boundary: generate_boundary(),
            parts: Vec::new(),
        }
    }

    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// `multipart/form-data; boundary=...`
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part {
            name: name.into(),
            filename: None,
            content_type: None,
            body: PartBody::Bytes(Bytes::from(value.into())),
        });
        self
    }

    /// Add a field. A list value adds one entry per element.
    #[must_use]
    pub fn field(self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let name = name.into();
        match value.into() {
            FieldValue::Text(value) => self.text(name, value),
            FieldValue::List(values) => values
                .into_iter()
                .fold(self, |form, value| form.text(name.clone(), value)),
        }
    }

    #[must_use]
    pub fn file(mut self, file: FilePart) -> Self {
        let (body, default_type) = match file.data {
            FileData::Bytes(bytes) => (PartBody::Bytes(bytes), "application/octet-stream"),
            FileData::Text(text) => (PartBody::Bytes(Bytes::from(text)), "text/plain; charset=utf-8"),
            FileData::Stream { stream, length } => (PartBody::Stream { stream, length }, "application/octet-stream"),
        };
        self.parts.push(Part {
            name: file.name,
            filename: Some(file.filename.unwrap_or_else(|| "blob".to_owned())),
            content_type: Some(file.content_type.unwrap_or_else(|| default_type.to_owned())),
            body,
        });
        self
    }

    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.parts.iter().filter(|p| p.filename.is_some()).count()
    }

    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.parts.iter().any(|p| matches!(p.body, PartBody::Stream { .. }))
    }

    /// Encoded size, when every part has a known length.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        let mut total = self.trailer().len() as u64;
        for part in &self.parts {
            let payload = match &part.body {
                PartBody::Bytes(bytes) => bytes.len() as u64,
                PartBody::Stream { length, .. } => (*length)?,
            };
            total += part.header(&self.boundary).len() as u64 + payload + 2;
        }
        Some(total)
    }

    /// Encode the form. In-memory forms produce one buffer.
    #[must_use]
    pub fn into_body(self) -> FormBody {
        let length = self.content_length();
        let trailer = self.trailer();

        if !self.is_streaming() {
            let mut buf = BytesMut::with_capacity(length.unwrap_or(0) as usize);
            for part in self.parts {
                buf.extend_from_slice(part.header(&self.boundary).as_bytes());
                if let PartBody::Bytes(bytes) = part.body {
                    buf.extend_from_slice(&bytes);
                }
                buf.extend_from_slice(b"\r\n");
            }
            buf.extend_from_slice(trailer.as_bytes());
            return FormBody::Full(buf.freeze());
        }

        let mut segments: Vec<ByteStream> = Vec::with_capacity(self.parts.len() * 3 + 1);
        for part in self.parts {
            segments.push(once(Bytes::from(part.header(&self.boundary))));
            segments.push(match part.body {
                PartBody::Bytes(bytes) => once(bytes),
                PartBody::Stream { stream, .. } => stream,
            });
            segments.push(once(Bytes::from_static(b"\r\n")));
        }
        segments.push(once(Bytes::from(trailer)));

        FormBody::Stream {
            stream: boxed(stream::iter(segments).flatten()),
            length,
        }
    }

    fn trailer(&self) -> String {
        format!("--{}--\r\n", self.boundary)
    }
}

impl Part {
    fn header(&self, boundary: &str) -> String {
        let mut header = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{}\"",
            escape_quoted(&self.name)
        );
        if let Some(filename) = &self.filename {
            header.push_str(&format!("; filename=\"{}\"", escape_quoted(filename)));
        }
        header.push_str("\r\n");
        if let Some(content_type) = &self.content_type {
            header.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        header.push_str("\r\n");
        header
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("boundary", &self.boundary)
            .field("parts", &self.parts.len())
            .field("files", &self.file_count())
            .finish()
    }
}

fn once(bytes: Bytes) -> ByteStream {
    boxed(stream::iter([Ok(bytes)]))
}

/// Percent-encode the characters that would break a quoted header parameter.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
