//! Entity addressing within component tables.
//!
//! A [`Query`] names one entity inside one partition. The storage gateway
//! combines it with a component name into a [`TableId`]: every entity of a
//! partition shares the table, so listing a partition is a single table scan
//! in the storage engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::{Address, Entity, Partition};
use crate::hash::Fnv1a;

/// Opaque addressing value resolving to an entity's storage location.
///
/// Derived deterministically from an entity identifier and a partition tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Query {
    /// The addressed entity.
    pub entity: Entity,
    /// The partition the entity lives in.
    pub partition: Partition,
}

impl Query {
    /// Address `entity` within `partition`.
    #[must_use]
    pub const fn new(entity: Entity, partition: Partition) -> Self {
        Self { entity, partition }
    }

    /// Address `entity` within the root partition.
    #[must_use]
    pub const fn in_root(entity: Entity) -> Self {
        Self::new(entity, Partition::ROOT)
    }

    /// The query under which per-account data (such as the caller's role) is
    /// stored: the account address as an entity in the root partition.
    #[must_use]
    pub const fn for_address(address: Address) -> Self {
        Self::in_root(Entity(address.0))
    }

    /// Returns the addressed entity.
    #[must_use]
    pub const fn entity_id(&self) -> Entity {
        self.entity
    }

    /// Returns the partition tag.
    #[must_use]
    pub const fn partition(&self) -> Partition {
        self.partition
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.entity.0, self.partition.0)
    }
}

/// Identifier of a storage table: one per (component name, partition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(pub u64);

impl TableId {
    /// The table holding `component` values for the entity `query` addresses.
    #[must_use]
    pub const fn derive(component: &str, query: &Query) -> Self {
        Self::for_partition(component, query.partition)
    }

    /// The table holding `component` values for every entity of `partition`.
    ///
    /// A `0xff` separator follows the name; it never occurs in UTF-8 text, so
    /// no name/partition pair can collide with a longer name.
    #[must_use]
    pub const fn for_partition(component: &str, partition: Partition) -> Self {
        let hash = Fnv1a::new()
            .write(component.as_bytes())
            .write(&[0xff])
            .write_u64(partition.0)
            .finish();
        Self(hash)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
