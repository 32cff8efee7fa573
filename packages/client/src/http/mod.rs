//! Request/response building blocks
//!
//! Request options, body encoders, the response envelope and the transport
//! seam. The retrying client that ties them together lives in
//! [`crate::client`].

pub mod file_stream;
pub mod headers;
pub mod multipart;
pub mod progress;
pub mod request;
pub mod response;
pub mod transport;

pub use file_stream::{FileMetadata, FileStreamResponse};
pub use multipart::{FieldValue, FileData, FilePart, Form, FormBody};
pub use progress::{ProgressCallback, UploadProgress, UploadStage};
pub use request::{RequestBody, RequestOptions, ResponseMode};
pub use response::{ResponseBody, ResponseEnvelope};
pub use transport::{HttpTransport, StatusText, TransportBody, TransportRequest, TransportResponse};
