//! Duplex messages and close events

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::binary::codec::decode_utf8;
use crate::binary::BinaryData;
use crate::error::{self, Result};

/// Whether a message arrived as a text or a binary frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Text,
    Binary,
}

/// One inbound or outbound message.
///
/// The payload is held once; [`as_text`](Self::as_text) and
/// [`as_bytes`](Self::as_bytes) borrow it and [`json`](Self::json) parses
/// from the borrowed bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplexMessage {
    kind: MessageKind,
    payload: Bytes,
}

impl DuplexMessage {
    pub fn text(text: impl Into<String>) -> Self {
        DuplexMessage {
            kind: MessageKind::Text,
            payload: Bytes::from(text.into()),
        }
    }

    pub fn binary(bytes: impl Into<Bytes>) -> Self {
        DuplexMessage {
            kind: MessageKind::Binary,
            payload: bytes.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.kind == MessageKind::Text
    }

    #[inline]
    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.kind == MessageKind::Binary
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    /// Payload as UTF-8, whatever the frame kind.
    pub fn as_text(&self) -> Result<&str> {
        decode_utf8(&self.payload).map_err(error::decode)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.payload).map_err(error::decode)
    }

    #[must_use]
    pub fn to_binary_data(&self) -> BinaryData {
        BinaryData::from(self.payload.clone())
    }

    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.payload
    }
}

/// Why a connection closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseEvent {
    pub code: u16,
    pub reason: String,
    /// Both sides exchanged close frames
    pub was_clean: bool,
}

impl CloseEvent {
    /// Normal closure
    pub const NORMAL: u16 = 1000;
    /// Peer is going away
    pub const GOING_AWAY: u16 = 1001;
    /// Close frame carried no status code
    pub const NO_STATUS: u16 = 1005;
    /// No close frame was received
    pub const ABNORMAL: u16 = 1006;

    pub(crate) fn abnormal() -> Self {
        CloseEvent {
            code: Self::ABNORMAL,
            reason: String::new(),
            was_clean: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_share_one_payload() {
        let message = DuplexMessage::text(r#"{"n":3}"#);
        assert!(message.is_text());
        assert_eq!(message.as_text().unwrap(), r#"{"n":3}"#);
        assert_eq!(message.json::<serde_json::Value>().unwrap()["n"], 3);
        assert_eq!(message.to_binary_data().as_slice(), message.as_bytes());
    }

    #[test]
    fn invalid_utf8_binary_fails_text_decode() {
        let message = DuplexMessage::binary(vec![0xff, 0xfe]);
        assert!(message.is_binary());
        assert!(message.as_text().unwrap_err().is_decode());
        assert_eq!(message.len(), 2);
    }
}
