//! Storage gateway: entity reads and writes by component name.
//!
//! The gateway translates `(component name, query)` into a table and hands
//! the call to the storage engine. Permission checks belong to the engine
//! and to the routes granted at bootstrap; nothing is enforced here.
//!
//! Writes and deletes are keyed differently. A write is attributed to the
//! component's registered module; a delete is attributed to the module
//! currently executing.

use tracing::debug;
use world_types::{Entity, Field, Partition, Query, TableId};

use crate::error::WorldError;
use crate::world::World;

impl World {
    /// Write `values` into `component` for the entity `query` addresses,
    /// starting at field `offset`.
    ///
    /// # Errors
    ///
    /// Propagates storage engine failures.
    pub fn set_entity(
        &mut self,
        component: &str,
        query: &Query,
        offset: usize,
        values: &[Field],
    ) -> Result<(), WorldError> {
        let caller = self.current_caller();
        let module = self.components.resolve(component);
        let table = TableId::derive(component, query);
        debug!(component, %query, offset, len = values.len(), %caller, %table, "set entity");
        self.database.write(module, table, query, offset, values)?;
        Ok(())
    }

    /// Remove `component` from the entity `query` addresses. Returns whether
    /// a value was present.
    ///
    /// # Errors
    ///
    /// Propagates storage engine failures.
    pub fn delete_entity(&mut self, component: &str, query: &Query) -> Result<bool, WorldError> {
        let caller = self.current_caller();
        let table = TableId::derive(component, query);
        debug!(component, %query, %caller, %table, "delete entity");
        Ok(self.database.delete(caller, table, query)?)
    }

    /// Read up to `length` fields of `component` starting at `offset`.
    ///
    /// An entity without the component reads as an empty buffer.
    ///
    /// # Errors
    ///
    /// Propagates storage engine failures.
    pub fn entity(
        &self,
        component: &str,
        query: &Query,
        offset: usize,
        length: usize,
    ) -> Result<Vec<Field>, WorldError> {
        let module = self.components.resolve(component);
        let table = TableId::derive(component, query);
        let values = self.database.read(module, table, query, offset, length)?;
        Ok(values.unwrap_or_default())
    }

    /// Every entity of `partition` holding `component`, in the engine's
    /// order.
    ///
    /// # Errors
    ///
    /// Propagates storage engine failures.
    pub fn entities(&self, component: &str, partition: Partition) -> Result<Vec<Entity>, WorldError> {
        let table = TableId::for_partition(component, partition);
        Ok(self.database.list(table, partition)?)
    }
}
