//! Error types for the canonical codec.

use thiserror::Error;

/// Errors raised while encoding or decoding canonical values.
///
/// Decode-side variants carry the field name or top-level kind so callers can
/// point at the offending part of a payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The bytes are not a well-formed canonical item.
    #[error("malformed canonical bytes: {0}")]
    Decode(String),

    /// The top-level item is not of the kind the caller asked for.
    #[error("expected top-level {expected}, found {found}")]
    UnexpectedKind {
        expected: &'static str,
        found: &'static str,
    },

    /// The value has no mapping onto the wire model.
    #[error("unsupported value: {0}")]
    UnsupportedValue(String),

    /// The bytes decode, but re-encoding them gives different bytes.
    #[error("bytes are not in canonical form")]
    NonCanonical,

    /// A versioned buffer was shorter than its 4-byte version prefix.
    #[error("buffer of {len} bytes is too short for the protocol version prefix")]
    MissingVersionPrefix { len: usize },

    /// A required map field is absent.
    #[error("missing field `{0}`")]
    MissingField(String),

    /// A map field is present but has the wrong shape.
    #[error("field `{field}` is {found}, expected {expected}")]
    InvalidFieldType {
        field: String,
        expected: String,
        found: String,
    },
}

pub type CodecResult<T> = Result<T, CodecError>;
