//! Integer identifiers: accounts, entities, and partitions.
//!
//! None of these carry data. An [`Address`] names an external actor (or an
//! executor slot), an [`Entity`] is a subject that components attach to, and
//! a [`Partition`] groups entities for listing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of an external caller or an attached executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address(pub u64);

impl Address {
    /// The zero address.
    pub const ZERO: Address = Address(0);

    /// Returns the raw `u64` value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A unique entity identifier within a partition.
///
/// Entities are pure identifiers; their state is the union of the component
/// values stored under queries that address them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(pub u64);

impl Entity {
    /// Create an entity from a raw `u64` identifier.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// A grouping tag used to scope entity listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Partition(pub u64);

impl Partition {
    /// The partition used when a caller does not name one.
    pub const ROOT: Partition = Partition(0);
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Partition({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_creation() {
        let e = Entity::from_raw(42);
        assert_eq!(e.id(), 42);
        assert_eq!(e.to_string(), "Entity(42)");
    }

    #[test]
    fn test_address_display_is_hex() {
        assert_eq!(Address(255).to_string(), "0xff");
        assert_eq!(Address::ZERO.raw(), 0);
    }

    #[test]
    fn test_root_partition_is_default() {
        assert_eq!(Partition::default(), Partition::ROOT);
    }
}
