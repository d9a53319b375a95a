//! Built-in component schemas and their addressing.

use world_core::{ComponentSchema, ROLE_COMPONENT, World, WorldError};
use world_types::hash::Fnv1a;
use world_types::{Entity, ModuleRef, Permission, Query};

/// Component holding the permission bits granted to a system on a component.
pub const AUTHORIZATION_COMPONENT: &str = "Authorization";

/// `Role`: one field, a short-string role name, keyed by account address.
#[must_use]
pub fn role_schema() -> ComponentSchema {
    ComponentSchema::new(ROLE_COMPONENT, &["role"])
}

/// `Authorization`: one field, the granted permission bits, keyed by
/// [`grant_query`].
#[must_use]
pub fn authorization_schema() -> ComponentSchema {
    ComponentSchema::new(AUTHORIZATION_COMPONENT, &["permission"])
}

/// Where the grant of `component` to the system named `system` is stored.
#[must_use]
pub fn grant_query(system: &str, component: ModuleRef) -> Query {
    let entity = Fnv1a::new()
        .write(system.as_bytes())
        .write(&[0xff])
        .write(&component.0)
        .finish();
    Query::in_root(Entity(entity))
}

/// Permission granted to `system` on `component`. [`Permission::NONE`] when
/// nothing was granted.
///
/// # Errors
///
/// Propagates storage engine failures.
pub fn authorization(
    world: &World,
    system: &str,
    component: ModuleRef,
) -> Result<Permission, WorldError> {
    let values = world.entity(AUTHORIZATION_COMPONENT, &grant_query(system, component), 0, 1)?;
    // Only the low three bits are meaningful.
    let bits = values.first().map_or(0, |bits| (bits & 0b111) as u8);
    Ok(Permission(bits))
}
