//! MessagePack encoding of the calldata and results handed to
//! `Executor::execute`.
//!
//! The world itself only encodes one thing: each `Route` it feeds to
//! `RouteAuth` during the bootstrap. `GrantRole` takes a MessagePack
//! `RoleGrant`. Other systems may use any layout, but the built-ins and the
//! server expect these helpers.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Encode a value to MessagePack bytes.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    rmp_serde::to_vec(value).map_err(CodecError::Encode)
}

/// Decode a value from MessagePack bytes.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] if deserialisation fails.
pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, CodecError> {
    rmp_serde::from_slice(bytes).map_err(CodecError::Decode)
}
