//! Canonical byte-sequence type and conversions
//!
//! [`BinaryData`] wraps `bytes::Bytes`. Every constructor and accessor copies
//! except [`BinaryData::view`], which shares storage with its source.

use std::fmt;
use std::ops::{Bound, Deref, RangeBounds};

use bytes::{Bytes, BytesMut};

pub mod codec;
pub mod stream;

pub use codec::DecodeError;
pub use stream::{boxed, chunked, collect_stream, collect_stream_limited, ByteStream};

/// Opaque fixed-length byte sequence.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinaryData(Bytes);

impl BinaryData {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Bytes::new())
    }

    /// Copy `bytes` into a new buffer.
    #[must_use]
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }

    /// UTF-8 encoding of `text`.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::copy_from_slice(text.as_bytes())
    }

    /// Decode standard (padded) base64.
    pub fn from_base64(input: &str) -> Result<Self, DecodeError> {
        codec::decode_base64(input).map(Self::from)
    }

    /// Decode hexadecimal, upper- or lowercase.
    pub fn from_hex(input: &str) -> Result<Self, DecodeError> {
        codec::decode_hex(input).map(Self::from)
    }

    /// Strict UTF-8 decoding.
    pub fn to_text(&self) -> Result<String, DecodeError> {
        codec::decode_utf8(&self.0).map(str::to_owned)
    }

    /// Borrow the payload as text without copying.
    pub fn as_text(&self) -> Result<&str, DecodeError> {
        codec::decode_utf8(&self.0)
    }

    #[must_use]
    pub fn to_base64(&self) -> String {
        codec::encode_base64(&self.0)
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        codec::encode_hex(&self.0)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    #[inline]
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Concatenate `parts` into one freshly allocated sequence.
    pub fn concat<I, B>(parts: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut buf = BytesMut::new();
        for part in parts {
            buf.extend_from_slice(part.as_ref());
        }
        Self(buf.freeze())
    }

    /// Independent copy of `range`. `None` if the range is out of bounds.
    #[must_use]
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Option<Self> {
        let (start, end) = self.bounds(range)?;
        Some(Self::copy_from_slice(&self.0[start..end]))
    }

    /// Zero-copy view of `range`.
    ///
    /// The view shares storage with `self`. It is cheap to create and keeps
    /// the whole source buffer alive; do not assume it is independent.
    #[must_use]
    pub fn view(&self, range: impl RangeBounds<usize>) -> Option<Self> {
        let (start, end) = self.bounds(range)?;
        Some(Self(self.0.slice(start..end)))
    }

    /// Byte-for-byte equality with any byte slice.
    #[must_use]
    pub fn equals(&self, other: impl AsRef<[u8]>) -> bool {
        self.0.as_ref() == other.as_ref()
    }

    fn bounds(&self, range: impl RangeBounds<usize>) -> Option<(usize, usize)> {
        let start = match range.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n.checked_add(1)?,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&n) => n.checked_add(1)?,
            Bound::Excluded(&n) => n,
            Bound::Unbounded => self.len(),
        };
        (start <= end && end <= self.len()).then_some((start, end))
    }
}

impl Deref for BinaryData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for BinaryData {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Bytes> for BinaryData {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<Vec<u8>> for BinaryData {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<&[u8]> for BinaryData {
    fn from(bytes: &[u8]) -> Self {
        Self::copy_from_slice(bytes)
    }
}

impl From<String> for BinaryData {
    fn from(text: String) -> Self {
        Self(Bytes::from(text))
    }
}

impl From<&str> for BinaryData {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<BinaryData> for Bytes {
    fn from(data: BinaryData) -> Self {
        data.0
    }
}

impl fmt::Debug for BinaryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 16;
        let preview = codec::encode_hex(&self.0[..self.len().min(PREVIEW)]);
        f.debug_struct("BinaryData")
            .field("len", &self.len())
            .field("head", &preview)
            .finish()
    }
}
