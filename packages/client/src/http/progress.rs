//! Upload progress reporting

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::binary::{boxed, ByteStream};

/// Phase of a streamed upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStage {
    /// Body assembly, before any byte moves
    Preparing,
    /// File bytes handed to the transport
    Uploading,
    /// Body sent, waiting for the response
    Processing,
    /// Response received and accepted
    Completed,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UploadStage::Preparing => "preparing",
            UploadStage::Uploading => "uploading",
            UploadStage::Processing => "processing",
            UploadStage::Completed => "completed",
        })
    }
}

/// One progress event. Byte counts are cumulative over all files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadProgress {
    pub stage: UploadStage,
    pub uploaded_bytes: u64,
    /// Sum of the file sizes, `0` when some size is unknown
    pub total_bytes: u64,
    /// `0.0..=100.0`; `0.0` when the total is unknown
    pub percentage: f64,
    pub current_file: Option<String>,
}

/// Receives progress events.
pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// Shared counter that turns byte movement into [`UploadProgress`] events.
#[derive(Clone)]
pub(crate) struct ProgressTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    callback: Option<ProgressCallback>,
    uploaded: AtomicU64,
    total: u64,
    processing: AtomicBool,
    completed: AtomicBool,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Option<ProgressCallback>, total: Option<u64>) -> Self {
        ProgressTracker {
            inner: Arc::new(TrackerInner {
                callback,
                uploaded: AtomicU64::new(0),
                total: total.unwrap_or(0),
                processing: AtomicBool::new(false),
                completed: AtomicBool::new(false),
            }),
        }
    }

    pub(crate) fn preparing(&self) {
        self.emit(UploadStage::Preparing, 0, None);
    }

    /// Emits `processing` the first time only.
    pub(crate) fn processing(&self) {
        if !self.inner.processing.swap(true, Ordering::AcqRel) {
            self.emit(UploadStage::Processing, self.uploaded(), None);
        }
    }

    /// Emits `completed` the first time only.
    pub(crate) fn completed(&self) {
        if !self.inner.completed.swap(true, Ordering::AcqRel) {
            self.emit(UploadStage::Completed, self.uploaded(), None);
        }
    }

    pub(crate) fn uploaded(&self) -> u64 {
        self.inner.uploaded.load(Ordering::Acquire)
    }

    /// Re-chunk `source` to at most `chunk_size` bytes per item and report
    /// each chunk as it is pulled.
    pub(crate) fn track(&self, label: String, source: ByteStream, chunk_size: usize) -> ByteStream {
        let tracker = self.clone();
        let chunk_size = chunk_size.max(1);
        let rechunked = source.flat_map(move |item| {
            let pieces: Vec<_> = match item {
                Ok(bytes) => split(bytes, chunk_size).into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            };
            stream::iter(pieces)
        });
        boxed(rechunked.inspect(move |item| {
            if let Ok(chunk) = item {
                tracker.advance(chunk.len() as u64, &label);
            }
        }))
    }

    fn advance(&self, bytes: u64, label: &str) {
        if bytes == 0 {
            return;
        }
        let uploaded = self.inner.uploaded.fetch_add(bytes, Ordering::AcqRel) + bytes;
        self.emit(UploadStage::Uploading, uploaded, Some(label));
    }

    #[allow(clippy::cast_precision_loss)]
    fn emit(&self, stage: UploadStage, uploaded_bytes: u64, current_file: Option<&str>) {
        let Some(callback) = &self.inner.callback else {
            return;
        };
        let total_bytes = self.inner.total;
        let percentage = if total_bytes == 0 {
            0.0
        } else {
            (uploaded_bytes as f64 / total_bytes as f64 * 100.0).min(100.0)
        };
        callback(UploadProgress {
            stage,
            uploaded_bytes,
            total_bytes,
            percentage,
            current_file: current_file.map(str::to_owned),
        });
    }
}

fn split(mut bytes: Bytes, chunk_size: usize) -> Vec<Bytes> {
    let mut pieces = Vec::with_capacity(bytes.len() / chunk_size + 1);
    while bytes.len() > chunk_size {
        pieces.push(bytes.split_to(chunk_size));
    }
    if !bytes.is_empty() {
        pieces.push(bytes);
    }
    pieces
}
