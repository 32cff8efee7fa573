//! Lossless text, base64 and hex conversions

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Malformed input to one of the decoders.
///
/// Decoders never return partial output: on error nothing is produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

#[inline]
#[must_use]
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_base64(input: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(STANDARD.decode(input)?)
}

#[inline]
#[must_use]
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Accepts upper- and lowercase digits. Odd lengths are rejected.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(hex::decode(input)?)
}

pub fn decode_utf8(bytes: &[u8]) -> Result<&str, DecodeError> {
    Ok(std::str::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_round_trip_covers_every_byte() {
        let bytes: Vec<u8> = (0..=255).collect();
        let encoded = encode_base64(&bytes);
        assert_eq!(decode_base64(&encoded).unwrap(), bytes);
    }

    #[test]
    fn malformed_base64_is_rejected() {
        for input in ["abc", "a===", "ab$d", "Zm9v\u{e9}"] {
            assert!(
                matches!(decode_base64(input), Err(DecodeError::Base64(_))),
                "{input:?} should not decode"
            );
        }
    }

    #[test]
    fn hex_accepts_both_cases() {
        assert_eq!(decode_hex("DEADbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(encode_hex(&[0xde, 0xad]), "dead");
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(matches!(decode_hex("abc"), Err(DecodeError::Hex(_))));
        assert!(matches!(decode_hex("zz"), Err(DecodeError::Hex(_))));
    }

    #[test]
    fn decode_errors_compare_by_value() {
        assert_eq!(decode_hex("abc").unwrap_err(), DecodeError::Hex(hex::FromHexError::OddLength));
        assert_ne!(decode_hex("abc").unwrap_err(), decode_hex("zz").unwrap_err());
        let copy = decode_base64("a===").unwrap_err().clone();
        assert_eq!(copy, decode_base64("a===").unwrap_err());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(matches!(decode_utf8(&[0xff, 0xfe]), Err(DecodeError::Utf8(_))));
    }
}
