use thiserror::Error;

/// Errors that can occur while reading incoming payload bytes.
///
/// Any of these coming out of a packet handed to us by the transport means
/// the payload is malformed: the message must be dropped, never applied
/// partially.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// Ran out of payload bytes mid-value
    #[error("unexpected end of payload")]
    Eof,

    /// A tag byte did not match any known variant
    #[error("invalid tag value {value} while reading {what}")]
    InvalidTag { what: &'static str, value: u8 },

    /// A length-prefixed string was not valid UTF-8
    #[error("payload string is not valid utf-8")]
    BadString,
}
