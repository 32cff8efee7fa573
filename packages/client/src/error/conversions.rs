use http::header::{InvalidHeaderName, InvalidHeaderValue};

use super::types::Error;
use crate::binary::DecodeError;

impl From<InvalidHeaderName> for Error {
    fn from(error: InvalidHeaderName) -> Self {
        super::builder(error)
    }
}

impl From<InvalidHeaderValue> for Error {
    fn from(error: InvalidHeaderValue) -> Self {
        super::builder(error)
    }
}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        super::builder(error)
    }
}

impl From<http::Error> for Error {
    fn from(error: http::Error) -> Self {
        super::builder(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        super::decode(error)
    }
}

impl From<DecodeError> for Error {
    fn from(error: DecodeError) -> Self {
        super::decode(error)
    }
}
