//! # world_builtin
//!
//! Modules every world ships with.
//!
//! - `Role` and `Authorization` components.
//! - `RouteAuth`, which the bootstrap feeds each route to.
//! - `GrantRole`, which the host uses to seed roles (the first admin) before
//!   the bootstrap.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use world_core::{MemoryDatabase, ModuleHost, World, WorldConfig};
//! use world_types::Address;
//!
//! let host = Arc::new(ModuleHost::new());
//! let mut world = World::new(WorldConfig::default(), MemoryDatabase::new(), Address(1), host.clone());
//! world_builtin::install(&mut world, &host).unwrap();
//! world_builtin::grant_role(&mut world, Address(0xad), "Admin").unwrap();
//! world.initialize(Address(0xad), &[]).unwrap();
//! ```

pub mod components;
pub mod systems;

pub use components::{
    AUTHORIZATION_COMPONENT, authorization, authorization_schema, grant_query, role_schema,
};
pub use systems::{GRANT_ROLE_SYSTEM, GrantRole, RoleGrant, RouteAuth};

use tracing::info;
use world_core::{ModuleHost, World, WorldError};
use world_types::{Address, ModuleRef, encode};

/// References of the installed built-in modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtins {
    pub role: ModuleRef,
    pub authorization: ModuleRef,
    pub route_auth: ModuleRef,
    pub grant_role: ModuleRef,
}

/// Install the built-in modules into `host` and register them with `world`.
///
/// # Errors
///
/// Fails if a built-in name is already bound to something else under a
/// rejecting collision policy, or if the world's execution target is not
/// `host`.
pub fn install(world: &mut World, host: &ModuleHost) -> Result<Builtins, WorldError> {
    let builtins = Builtins {
        role: host.install(role_schema()),
        authorization: host.install(authorization_schema()),
        route_auth: host.install(RouteAuth),
        grant_role: host.install(GrantRole),
    };

    world.register_component(builtins.role)?;
    world.register_component(builtins.authorization)?;
    world.register_system(builtins.route_auth)?;
    world.register_system(builtins.grant_role)?;

    info!(world = %world.config().name, "built-in modules installed");
    Ok(builtins)
}

/// Run `GrantRole` as the host to give `address` the role `role`.
///
/// This is the only way to reach `GrantRole`; an ordinary `execute` of it is
/// refused.
///
/// # Errors
///
/// Fails once the world is initialized, or if `role` is longer than eight
/// bytes.
pub fn grant_role(world: &mut World, address: Address, role: &str) -> Result<(), WorldError> {
    let calldata = encode(&RoleGrant::new(address, role))?;
    world.execute_as_host(GRANT_ROLE_SYSTEM, &calldata)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use world_core::{MemoryDatabase, ROUTE_AUTH_SYSTEM, SystemFn, WorldConfig};
    use world_types::{CodecError, Permission, Route};

    use super::*;

    const ADMIN: Address = Address(0xad);

    fn world() -> (World, Arc<ModuleHost>, Builtins) {
        let host = Arc::new(ModuleHost::new());
        let mut world = World::new(
            WorldConfig::default(),
            MemoryDatabase::new(),
            Address(0xe0),
            host.clone(),
        );
        let builtins = install(&mut world, &host).unwrap();
        (world, host, builtins)
    }

    #[test]
    fn test_install_registers_everything() {
        let (world, _, builtins) = world();
        assert_eq!(world.component("Role"), builtins.role);
        assert_eq!(world.component(AUTHORIZATION_COMPONENT), builtins.authorization);
        assert_eq!(world.system(ROUTE_AUTH_SYSTEM), builtins.route_auth);
        assert_eq!(world.system(GRANT_ROLE_SYSTEM), builtins.grant_role);
    }

    #[test]
    fn test_install_twice_is_idempotent() {
        let (mut world, host, first) = world();
        let second = install(&mut world, &host).unwrap();
        assert_eq!(first, second);
        assert_eq!(world.systems().binding(ROUTE_AUTH_SYSTEM).unwrap().version, 1);
    }

    #[test]
    fn test_grant_role_makes_admin() {
        let (mut world, _, _) = world();
        assert!(world.ensure_admin(ADMIN).is_err());
        grant_role(&mut world, ADMIN, "Admin").unwrap();
        world.ensure_admin(ADMIN).unwrap();
    }

    #[test]
    fn test_other_roles_are_not_admin() {
        let (mut world, _, _) = world();
        grant_role(&mut world, ADMIN, "Player").unwrap();
        assert!(matches!(
            world.ensure_admin(ADMIN),
            Err(WorldError::PermissionDenied { .. })
        ));
    }

    #[test]
    fn test_grant_role_rejects_long_names() {
        let (mut world, _, _) = world();
        let err = grant_role(&mut world, ADMIN, "Administrator").unwrap_err();
        assert!(matches!(
            err,
            WorldError::Codec(CodecError::ShortStringTooLong(_))
        ));
    }

    #[test]
    fn test_route_auth_records_permission() {
        let (mut world, _, builtins) = world();
        grant_role(&mut world, ADMIN, "Admin").unwrap();
        let routes = [
            Route::new(builtins.role, "Move", Permission::READ | Permission::WRITE),
            Route::new(builtins.authorization, "Audit", Permission::READ),
        ];
        world.initialize(ADMIN, &routes).unwrap();

        assert_eq!(
            authorization(&world, "Move", builtins.role).unwrap(),
            Permission::READ | Permission::WRITE
        );
        assert_eq!(
            authorization(&world, "Audit", builtins.authorization).unwrap(),
            Permission::READ
        );
        assert_eq!(
            authorization(&world, "Move", builtins.authorization).unwrap(),
            Permission::NONE
        );
    }

    #[test]
    fn test_route_auth_refuses_unregistered_component() {
        let (mut world, _, _) = world();
        grant_role(&mut world, ADMIN, "Admin").unwrap();
        let stray = ModuleRef::from_artifact(b"stray");
        let err = world
            .initialize(ADMIN, &[Route::new(stray, "Move", Permission::ALL)])
            .unwrap_err();
        assert!(matches!(err, WorldError::Module { .. }));
        assert!(!world.is_initialized());
    }

    #[test]
    fn test_grant_role_closed_after_initialize() {
        let (mut world, _, builtins) = world();
        grant_role(&mut world, ADMIN, "Admin").unwrap();
        world.initialize(ADMIN, &[]).unwrap();

        let err = grant_role(&mut world, Address(0x77), "Admin").unwrap_err();
        assert!(matches!(err, WorldError::Module { module, .. } if module == builtins.grant_role));
        assert!(world.ensure_admin(Address(0x77)).is_err());
    }

    #[test]
    fn test_plain_execute_cannot_grant_roles() {
        let (mut world, _, builtins) = world();
        let calldata = encode(&RoleGrant::new(Address(0x66), "Admin")).unwrap();

        let err = world.execute(GRANT_ROLE_SYSTEM, &calldata).unwrap_err();
        assert!(matches!(err, WorldError::Module { module, .. } if module == builtins.grant_role));
        assert!(world.ensure_admin(Address(0x66)).is_err());
        assert!(world.initialize(Address(0x66), &[]).is_err());
    }

    #[test]
    fn test_host_call_does_not_extend_to_nested_grant() {
        let (mut world, host, _) = world();
        let relay = host.install(SystemFn::new("Relay", "1", |world, calldata| {
            world.execute(GRANT_ROLE_SYSTEM, calldata)
        }));
        world.register_system(relay).unwrap();

        let calldata = encode(&RoleGrant::new(Address(0x66), "Admin")).unwrap();
        let err = world.execute_as_host("Relay", &calldata).unwrap_err();
        assert!(matches!(err, WorldError::Module { .. }));
        assert!(world.ensure_admin(Address(0x66)).is_err());
    }
}
