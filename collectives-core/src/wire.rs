//! The serialization facade each collective talks through.
//!
//! The source parameterizes its collectives over a `value_type` /
//! `serializer` / `deserializer` / `get_buffer` quartet so the wire format
//! can be swapped without touching the tree-walking logic. This crate keeps
//! that seam as the [`Serialization`] trait, but fixes `value_type` at
//! `Vec<u8>` (an opaque byte buffer, matching "forward raw bytes, not
//! decoded values" for broadcast-binary) and ships exactly one backend,
//! [`BincodeBackend`], since `timely` itself depends on `serde` + `bincode`
//! for this purpose.
//!
//! A serialization failure here is a programming error (a type mismatch
//! between what a sender packed and what a receiver expects), not a
//! recoverable runtime condition, so both directions panic on failure rather
//! than returning a `Result` — the same posture the rest of the runtime
//! takes toward in-flight collective failures.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes and decodes values exchanged by a collective.
///
/// Implementors are zero-sized marker types selecting a wire format at
/// compile time, the same role the source's template `serializer`/
/// `deserializer` parameters play.
pub trait Serialization {
    /// Encodes `value` into an opaque byte buffer.
    fn encode<T: Serialize>(value: &T) -> Vec<u8>;

    /// Decodes a byte buffer previously produced by [`Self::encode`].
    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> T;

    /// Encodes a bundle of values as a single buffer.
    ///
    /// Scatter and gather move a `Vec<T>` of per-rank segments as one
    /// mailbox payload; bincode already length-prefixes `Vec` encodings, so
    /// this needs no hand-rolled framing the way the source's raw-pointer
    /// buffers do.
    fn encode_bundle<T: Serialize>(values: &[T]) -> Vec<u8> {
        Self::encode(&values)
    }

    /// Decodes a bundle previously produced by [`Self::encode_bundle`].
    fn decode_bundle<T: DeserializeOwned>(bytes: &[u8]) -> Vec<T> {
        Self::decode(bytes)
    }
}

/// The `bincode` + `serde` wire format.
pub struct BincodeBackend;

impl Serialization for BincodeBackend {
    fn encode<T: Serialize>(value: &T) -> Vec<u8> {
        bincode::serialize(value).expect("bincode encoding failed")
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> T {
        bincode::deserialize(bytes).expect("bincode decoding failed")
    }
}
