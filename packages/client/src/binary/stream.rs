//! Byte-chunk streams

use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};

use crate::error::{self, Result};

/// Boxed stream of body chunks.
///
/// `Send` on server targets; browser streams wrap JavaScript handles and
/// are local to the thread that created them.
#[cfg(not(target_arch = "wasm32"))]
pub type ByteStream = futures::stream::BoxStream<'static, Result<Bytes>>;

/// Boxed stream of body chunks.
#[cfg(target_arch = "wasm32")]
pub type ByteStream = futures::stream::LocalBoxStream<'static, Result<Bytes>>;

/// Erase a concrete chunk stream into a [`ByteStream`].
#[cfg(not(target_arch = "wasm32"))]
pub fn boxed<S>(stream: S) -> ByteStream
where
    S: Stream<Item = Result<Bytes>> + Send + 'static,
{
    stream.boxed()
}

/// Erase a concrete chunk stream into a [`ByteStream`].
#[cfg(target_arch = "wasm32")]
pub fn boxed<S>(stream: S) -> ByteStream
where
    S: Stream<Item = Result<Bytes>> + 'static,
{
    stream.boxed_local()
}

/// Split `data` into chunks of at most `chunk_size` bytes without copying.
pub fn chunked(data: impl Into<Bytes>, chunk_size: usize) -> ByteStream {
    let mut rest: Bytes = data.into();
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(rest.len() / chunk_size + 1);
    while !rest.is_empty() {
        let take = rest.len().min(chunk_size);
        chunks.push(Ok(rest.split_to(take)));
    }
    boxed(stream::iter(chunks))
}

/// Accumulate every chunk of `stream` into one buffer.
pub async fn collect_stream<S>(stream: S) -> Result<Bytes>
where
    S: Stream<Item = Result<Bytes>>,
{
    collect_stream_limited(stream, usize::MAX).await
}

/// Like [`collect_stream`] but fails with a decode error once more than
/// `limit` bytes have arrived.
pub async fn collect_stream_limited<S>(stream: S, limit: usize) -> Result<Bytes>
where
    S: Stream<Item = Result<Bytes>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if buf.len().saturating_add(chunk.len()) > limit {
            return Err(error::decode(format!("body exceeds {limit} bytes")));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}
