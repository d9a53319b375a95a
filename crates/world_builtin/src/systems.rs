//! Built-in systems: `RouteAuth` and the genesis `GrantRole`.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use world_core::{Module, ROLE_COMPONENT, ROUTE_AUTH_SYSTEM, World, WorldError};
use world_types::{Address, CodecError, Field, Query, Route, decode, short_string};

use crate::components::{AUTHORIZATION_COMPONENT, grant_query};

/// Name of the genesis role-granting system.
pub const GRANT_ROLE_SYSTEM: &str = "GrantRole";

/// Records one route as an `Authorization` entry.
///
/// The route's component must be bound in the component registry;
/// anything else is refused so a bootstrap cannot grant on stale or
/// unknown schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteAuth;

impl Module for RouteAuth {
    fn name(&self) -> &str {
        ROUTE_AUTH_SYSTEM
    }

    fn artifact(&self) -> Vec<u8> {
        b"builtin:RouteAuth:1".to_vec()
    }

    fn call(&self, world: &mut World, calldata: &[u8]) -> Result<Vec<u8>, WorldError> {
        let route: Route = decode(calldata)?;
        let me = world.current_caller();

        let registered = world
            .components()
            .iter()
            .any(|binding| binding.module == route.component);
        if !registered {
            return Err(WorldError::module(
                me,
                format!("component {} is not registered", route.component),
            ));
        }

        debug!(system = %route.system, component = %route.component, permission = %route.permission, "granting");
        let query = grant_query(&route.system, route.component);
        world.set_entity(
            AUTHORIZATION_COMPONENT,
            &query,
            0,
            &[Field::from(route.permission.bits())],
        )?;
        Ok(Vec::new())
    }
}

/// Argument of `GrantRole`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub address: Address,
    /// At most eight bytes.
    pub role: String,
}

impl RoleGrant {
    /// Grant `role` to `address`.
    #[must_use]
    pub fn new(address: Address, role: impl Into<String>) -> Self {
        Self {
            address,
            role: role.into(),
        }
    }
}

/// Writes a `Role` for an address. This is how the first admin comes to
/// exist, so it only runs for the host process itself (see
/// [`World::execute_as_host`]) and only before the world is initialized.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantRole;

impl Module for GrantRole {
    fn name(&self) -> &str {
        GRANT_ROLE_SYSTEM
    }

    fn artifact(&self) -> Vec<u8> {
        b"builtin:GrantRole:1".to_vec()
    }

    fn call(&self, world: &mut World, calldata: &[u8]) -> Result<Vec<u8>, WorldError> {
        if !world.is_host_call() {
            return Err(WorldError::module(
                world.current_caller(),
                "roles can only be granted by the host",
            ));
        }
        if world.is_initialized() {
            return Err(WorldError::module(
                world.current_caller(),
                "roles can only be granted before initialization",
            ));
        }

        let grant: RoleGrant = decode(calldata)?;
        let role = short_string(&grant.role)
            .ok_or_else(|| CodecError::ShortStringTooLong(grant.role.clone()))?;

        info!(address = %grant.address, role = %grant.role, "granting role");
        world.set_entity(ROLE_COMPONENT, &Query::for_address(grant.address), 0, &[role])?;
        Ok(Vec::new())
    }
}
