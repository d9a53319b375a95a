//! Authorization bootstrap.
//!
//! `initialize` runs once per world. An admin hands over an ordered list of
//! routes and the world feeds each one, encoded, to the system registered as
//! `RouteAuth`. What a route grants is up to `RouteAuth`; the world only
//! guarantees ordering and that the bootstrap either completes or leaves the
//! world uninitialized.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use world_types::{Address, ModuleRef, Query, Route, codec, short_string_lossy};

use crate::error::WorldError;
use crate::events::WorldEvent;
use crate::registry::ModuleKind;
use crate::world::World;
use crate::{ADMIN_ROLE, ROLE_COMPONENT, ROUTE_AUTH_SYSTEM};

/// Bootstrap progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapState {
    #[default]
    Uninitialized,
    /// Routes are being processed.
    Initializing,
    /// Terminal.
    Initialized,
}

impl World {
    /// Run the authorization bootstrap on behalf of `caller`.
    ///
    /// Routes are processed strictly in order. The first failing route
    /// aborts the bootstrap and the world returns to uninitialized, so the
    /// call can be retried. Storage effects of routes that already succeeded
    /// are not undone.
    ///
    /// # Errors
    ///
    /// [`WorldError::PermissionDenied`] unless `caller` is an admin;
    /// [`WorldError::AlreadyInitialized`] if the bootstrap completed or is in
    /// progress; otherwise whatever `RouteAuth` returns.
    pub fn initialize(&mut self, caller: Address, routes: &[Route]) -> Result<(), WorldError> {
        self.ensure_admin(caller)?;
        if self.bootstrap != BootstrapState::Uninitialized {
            return Err(WorldError::AlreadyInitialized);
        }

        self.bootstrap = BootstrapState::Initializing;
        let route_auth = self.systems.resolve(ROUTE_AUTH_SYSTEM);
        info!(%caller, routes = routes.len(), %route_auth, "initializing");

        for (index, route) in routes.iter().enumerate() {
            if let Err(err) = self.authorize(route_auth, route) {
                warn!(index, system = %route.system, %err, "route rejected, bootstrap aborted");
                self.bootstrap = BootstrapState::Uninitialized;
                return Err(err);
            }
        }

        self.granted = routes.to_vec();
        self.bootstrap = BootstrapState::Initialized;
        self.events.push(WorldEvent::Initialized {
            routes: routes.len(),
        });
        Ok(())
    }

    fn authorize(&mut self, route_auth: ModuleRef, route: &Route) -> Result<(), WorldError> {
        debug!(system = %route.system, component = %route.component, permission = %route.permission, "authorizing route");
        let calldata = codec::encode(route)?;
        self.invoke(route_auth, &calldata, false)?;
        Ok(())
    }

    /// Returns `true` once the bootstrap has completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.bootstrap == BootstrapState::Initialized
    }

    /// Current bootstrap progress.
    #[must_use]
    pub fn bootstrap_state(&self) -> BootstrapState {
        self.bootstrap
    }

    /// Routes granted by the bootstrap, in grant order, with component
    /// references kept current across upgrades.
    #[must_use]
    pub fn granted_routes(&self) -> &[Route] {
        &self.granted
    }

    /// Check that `caller`'s `Role` component reads `Admin` at offset 0.
    ///
    /// # Errors
    ///
    /// [`WorldError::PermissionDenied`] otherwise, including when no `Role`
    /// component is registered (rows left in the `Role` table do not count
    /// while the name is unbound) or the caller has no role.
    pub fn ensure_admin(&self, caller: Address) -> Result<(), WorldError> {
        if self.components.resolve(ROLE_COMPONENT).is_zero() {
            debug!(%caller, "admin check failed: no Role component registered");
            return Err(WorldError::PermissionDenied { caller });
        }

        let role = self.entity(ROLE_COMPONENT, &Query::for_address(caller), 0, 1)?;
        match role.first() {
            Some(&held) if held == ADMIN_ROLE => Ok(()),
            held => {
                let held = held.map(|&field| short_string_lossy(field)).unwrap_or_default();
                debug!(%caller, role = %held, "admin check failed");
                Err(WorldError::PermissionDenied { caller })
            }
        }
    }

    /// Replay the granted routes affected by rebinding `name` from
    /// `previous` to `current`.
    ///
    /// Component upgrades rewrite the affected routes to the new reference.
    /// Upgrading `RouteAuth` itself replays every route.
    pub(crate) fn revalidate(
        &mut self,
        kind: ModuleKind,
        name: &str,
        previous: ModuleRef,
        current: ModuleRef,
    ) -> Result<(), WorldError> {
        let affected: Vec<(usize, Route)> = self
            .granted
            .iter()
            .enumerate()
            .filter_map(|(index, route)| {
                let hit = match kind {
                    ModuleKind::Component => route.component == previous,
                    ModuleKind::System => name == ROUTE_AUTH_SYSTEM || route.system == name,
                };
                hit.then(|| {
                    let mut route = route.clone();
                    if kind == ModuleKind::Component {
                        route.component = current;
                    }
                    (index, route)
                })
            })
            .collect();

        if affected.is_empty() {
            return Ok(());
        }
        info!(%kind, name, routes = affected.len(), "re-validating routes");

        let route_auth = self.systems.resolve(ROUTE_AUTH_SYSTEM);
        for (_, route) in &affected {
            self.authorize(route_auth, route)?;
        }
        for (index, route) in affected {
            self.granted[index] = route;
        }
        Ok(())
    }
}
