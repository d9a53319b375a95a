//! Codec and parsing error types.

/// Errors raised while encoding, decoding, or parsing world values.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Failed to encode a value to MessagePack.
    #[error("failed to encode buffer: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a value from MessagePack.
    #[error("failed to decode buffer: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// A module reference string was not 32 bytes of hex.
    #[error("invalid module reference '{0}'")]
    InvalidModuleRef(String),

    /// A short string did not fit into a single field.
    #[error("short string '{0}' is longer than 8 bytes")]
    ShortStringTooLong(String),
}
