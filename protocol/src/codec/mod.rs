//! # Canonical Codec
//!
//! Everything that turns protocol data into bytes goes through here:
//!
//! - [`value`]: the closed [`CanonicalValue`] model entities convert into.
//! - [`cbor`]: deterministic CBOR encoding and strict decoding, plus the
//!   4-byte protocol-version framing.
//! - [`convert`]: base58 / base64 / hex text forms for byte strings.
//!
//! Two implementations that agree on this module agree on every hash,
//! identifier and signature the protocol produces.

pub mod cbor;
pub mod convert;
pub mod error;
pub mod value;

pub use cbor::{
    decode, decode_array, decode_bytes, decode_string, decode_with_version, encode, encode_bytes,
    encode_map, encode_string, encode_with_version,
};
pub use convert::{ConversionError, Encoding};
pub use error::{CodecError, CodecResult};
pub use value::{array_of_maps, CanonicalMap, CanonicalMapExt, CanonicalValue};
