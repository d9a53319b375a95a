//! Content-addressed module identity.
//!
//! A [`ModuleRef`] is the SHA-256 digest of a module's artifact bytes. Two
//! references are equal exactly when they identify bit-identical logic, so a
//! name can be rebound to a new reference (an upgrade) without the world
//! keeping any version history of the artifact itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CodecError;

/// Opaque, content-addressed identifier of a component schema or system.
///
/// Serialised as a 64-character lowercase hex string so that it reads the
/// same in MessagePack buffers, JSON requests, and log lines.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ModuleRef(pub [u8; 32]);

impl ModuleRef {
    /// The absent reference. Registry lookups of unknown names return this.
    pub const ZERO: ModuleRef = ModuleRef([0; 32]);

    /// Derive the reference of a module from its artifact bytes.
    #[must_use]
    pub fn from_artifact(artifact: &[u8]) -> Self {
        let digest = Sha256::digest(artifact);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Returns `true` for [`ModuleRef::ZERO`].
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 32]
    }

    /// Full lowercase hex encoding.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex string.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidModuleRef`] if the string is not exactly
    /// 32 bytes of hex.
    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        let raw = hex::decode(s).map_err(|_| CodecError::InvalidModuleRef(s.to_string()))?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|_| CodecError::InvalidModuleRef(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 8 bytes are plenty to tell modules apart in debug output.
        write!(f, "ModuleRef({}..)", hex::encode(&self.0[..8]))
    }
}

impl FromStr for ModuleRef {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<ModuleRef> for String {
    fn from(module: ModuleRef) -> Self {
        module.to_hex()
    }
}

impl TryFrom<String> for ModuleRef {
    type Error = CodecError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_artifacts_share_a_reference() {
        let a = ModuleRef::from_artifact(b"fn move() {}");
        let b = ModuleRef::from_artifact(b"fn move() {}");
        assert_eq!(a, b);
        assert_ne!(a, ModuleRef::from_artifact(b"fn move() { /* v2 */ }"));
    }

    #[test]
    fn test_zero_reference() {
        assert!(ModuleRef::ZERO.is_zero());
        assert!(ModuleRef::default().is_zero());
        assert!(!ModuleRef::from_artifact(b"").is_zero());
    }

    #[test]
    fn test_sha256_of_empty_artifact() {
        assert_eq!(
            ModuleRef::from_artifact(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hex_parse() {
        let module = ModuleRef::from_artifact(b"position");
        let parsed: ModuleRef = module.to_hex().parse().unwrap();
        assert_eq!(parsed, module);
        assert!(ModuleRef::from_hex("abcd").is_err());
        assert!(ModuleRef::from_hex("not hex").is_err());
    }

    #[test]
    fn test_serialises_as_hex_string() {
        let module = ModuleRef::from_artifact(b"position");
        let json = serde_json::to_string(&module).unwrap();
        assert_eq!(json, format!("\"{}\"", module.to_hex()));
    }
}
