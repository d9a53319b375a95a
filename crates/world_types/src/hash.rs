//! FNV-1a 64-bit hashing used for deterministic table and grant addressing.
//!
//! The hash is language-neutral: any implementation applying FNV-1a to the
//! same bytes produces the same value, so table identifiers are stable across
//! processes and storage engines.

/// FNV-1a 64-bit offset basis.
pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a 64-bit prime.
pub const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Incremental FNV-1a 64-bit hasher.
///
/// ```text
/// hash = 0xcbf29ce484222325
/// for each byte:
///     hash = hash XOR byte
///     hash = hash * 0x00000100000001b3
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Fnv1a(u64);

impl Fnv1a {
    /// Start a new hash at the offset basis.
    #[must_use]
    pub const fn new() -> Self {
        Self(FNV_OFFSET_BASIS)
    }

    /// Feed bytes into the hash.
    #[must_use]
    pub const fn write(mut self, bytes: &[u8]) -> Self {
        let mut i = 0;
        while i < bytes.len() {
            self.0 ^= bytes[i] as u64;
            self.0 = self.0.wrapping_mul(FNV_PRIME);
            i += 1;
        }
        self
    }

    /// Feed a `u64` in little-endian byte order.
    #[must_use]
    pub const fn write_u64(self, value: u64) -> Self {
        self.write(&value.to_le_bytes())
    }

    /// Returns the hash value.
    #[must_use]
    pub const fn finish(self) -> u64 {
        self.0
    }
}

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}
