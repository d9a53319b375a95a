//! Storage engine boundary and the in-memory reference engine.
//!
//! The world never stores component data itself. Every entity read and
//! write goes through a [`Database`], addressed by table and query, and the
//! engine is free to lay the data out however it wants.

use std::collections::BTreeMap;

use world_types::{Entity, Field, ModuleRef, Partition, Query, TableId};

/// Errors raised by a storage engine.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A write range ends past the widest row the engine accepts.
    #[error("field range {offset}+{len} exceeds the row width")]
    RangeOverflow { offset: usize, len: usize },

    /// Engine-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// The storage engine consumed by the world.
pub trait Database: Send {
    /// Write `values` into the entity's field sequence starting at `offset`.
    ///
    /// # Errors
    ///
    /// Engine-specific.
    fn write(
        &mut self,
        module: ModuleRef,
        table: TableId,
        query: &Query,
        offset: usize,
        values: &[Field],
    ) -> Result<(), StorageError>;

    /// Delete the entity's value. Returns whether a value was present.
    ///
    /// # Errors
    ///
    /// Engine-specific.
    fn delete(
        &mut self,
        module: ModuleRef,
        table: TableId,
        query: &Query,
    ) -> Result<bool, StorageError>;

    /// Read up to `length` fields starting at `offset`. `None` when the
    /// entity has no value in this table.
    ///
    /// # Errors
    ///
    /// Engine-specific.
    fn read(
        &self,
        module: ModuleRef,
        table: TableId,
        query: &Query,
        offset: usize,
        length: usize,
    ) -> Result<Option<Vec<Field>>, StorageError>;

    /// Every entity of `partition` holding a value in `table`.
    ///
    /// # Errors
    ///
    /// Engine-specific.
    fn list(&self, table: TableId, partition: Partition) -> Result<Vec<Entity>, StorageError>;
}

/// Widest row [`MemoryDatabase::new`] accepts, in fields.
pub const DEFAULT_MAX_FIELDS: usize = 4096;

/// In-memory [`Database`] keyed by table then query.
///
/// Writing past the end of a row zero-fills the gap, up to `max_fields`
/// fields per row. Listing returns entities in ascending id order.
#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    tables: BTreeMap<TableId, BTreeMap<Query, Vec<Field>>>,
    max_fields: usize,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::with_max_fields(DEFAULT_MAX_FIELDS)
    }
}

impl MemoryDatabase {
    /// Create an empty database with the default row width.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty database whose rows hold at most `max_fields` fields.
    #[must_use]
    pub fn with_max_fields(max_fields: usize) -> Self {
        Self {
            tables: BTreeMap::new(),
            max_fields,
        }
    }
}

impl Database for MemoryDatabase {
    fn write(
        &mut self,
        _module: ModuleRef,
        table: TableId,
        query: &Query,
        offset: usize,
        values: &[Field],
    ) -> Result<(), StorageError> {
        let end = offset
            .checked_add(values.len())
            .filter(|&end| end <= self.max_fields)
            .ok_or(StorageError::RangeOverflow {
                offset,
                len: values.len(),
            })?;

        let row = self.tables.entry(table).or_default().entry(*query).or_default();
        if row.len() < end {
            row.resize(end, 0);
        }
        row[offset..end].copy_from_slice(values);
        Ok(())
    }

    fn delete(
        &mut self,
        _module: ModuleRef,
        table: TableId,
        query: &Query,
    ) -> Result<bool, StorageError> {
        let Some(stored) = self.tables.get_mut(&table) else {
            return Ok(false);
        };
        let removed = stored.remove(query).is_some();
        if stored.is_empty() {
            self.tables.remove(&table);
        }
        Ok(removed)
    }

    fn read(
        &self,
        _module: ModuleRef,
        table: TableId,
        query: &Query,
        offset: usize,
        length: usize,
    ) -> Result<Option<Vec<Field>>, StorageError> {
        let Some(row) = self.tables.get(&table).and_then(|rows| rows.get(query)) else {
            return Ok(None);
        };
        let start = offset.min(row.len());
        let end = offset.saturating_add(length).min(row.len());
        Ok(Some(row[start..end].to_vec()))
    }

    fn list(&self, table: TableId, partition: Partition) -> Result<Vec<Entity>, StorageError> {
        let Some(stored) = self.tables.get(&table) else {
            return Ok(Vec::new());
        };
        Ok(stored
            .keys()
            .filter(|query| query.partition == partition)
            .map(|query| query.entity)
            .collect())
    }
}
