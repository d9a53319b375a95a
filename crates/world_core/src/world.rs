//! World state and the dispatch broker.
//!
//! The [`World`] is the single record every operation goes through: both
//! module registries, the execution target, the bootstrap state, the call
//! stack, the id sequence, and the storage engine. It is an ordinary value
//! constructed once by the host and passed by `&mut` to each operation.
//!
//! Bootstrap and storage operations live in `bootstrap.rs` and `gateway.rs`
//! as further `impl World` blocks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};
use world_types::{Address, ModuleRef, Route};

use crate::bootstrap::BootstrapState;
use crate::calls::CallStack;
use crate::config::WorldConfig;
use crate::error::WorldError;
use crate::events::{EventQueue, WorldEvent};
use crate::executor::Executor;
use crate::registry::{Binding, ModuleKind, Rebind, Registry};
use crate::sequence::IdSequence;
use crate::storage::Database;

/// The ECS world.
pub struct World {
    pub(crate) config: WorldConfig,
    /// Address of the executor that runs module logic.
    pub(crate) execution_target: Address,
    /// Executors the host has attached, by address.
    pub(crate) executors: HashMap<Address, Arc<dyn Executor>>,
    pub(crate) components: Registry,
    pub(crate) systems: Registry,
    pub(crate) bootstrap: BootstrapState,
    /// Routes granted so far, replayed when a bound module is upgraded.
    pub(crate) granted: Vec<Route>,
    pub(crate) calls: CallStack,
    pub(crate) sequence: IdSequence,
    pub(crate) database: Box<dyn Database>,
    pub(crate) events: EventQueue,
}

impl World {
    /// Create a world whose execution target is `executor`, attached at
    /// `executor_address`. Registries start empty and the world starts
    /// uninitialized.
    pub fn new(
        config: WorldConfig,
        database: impl Database + 'static,
        executor_address: Address,
        executor: Arc<dyn Executor>,
    ) -> Self {
        let mut executors = HashMap::new();
        executors.insert(executor_address, executor);

        let mut world = Self {
            execution_target: executor_address,
            executors,
            components: Registry::new(ModuleKind::Component),
            systems: Registry::new(ModuleKind::System),
            bootstrap: BootstrapState::Uninitialized,
            granted: Vec::new(),
            calls: CallStack::new(config.max_call_depth),
            sequence: IdSequence::new(config.first_id),
            database: Box::new(database),
            events: EventQueue::new(),
            config,
        };
        world.events.push(WorldEvent::WorldSpawned {
            address: world.config.address,
            name: world.config.name.clone(),
        });
        world
    }

    /// The configuration the world was created with.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // -- Module registry --

    /// Register a component module under the name it reports.
    ///
    /// Registering a different module under an existing name is an upgrade
    /// (or a [`WorldError::NameTaken`] failure, depending on the collision
    /// policy). An upgrade after initialization re-runs `RouteAuth` for the
    /// routes that named the previous module; if that fails, the previous
    /// binding is restored.
    ///
    /// # Errors
    ///
    /// Propagates executor introspection failures, collision rejections,
    /// and re-validation failures.
    pub fn register_component(&mut self, module: ModuleRef) -> Result<String, WorldError> {
        self.register(ModuleKind::Component, module)
    }

    /// Register a system module under the name it reports.
    ///
    /// Same upgrade rules as [`World::register_component`]; re-validation
    /// replays the routes that grant to this system name.
    ///
    /// # Errors
    ///
    /// Propagates executor introspection failures, collision rejections,
    /// and re-validation failures.
    pub fn register_system(&mut self, module: ModuleRef) -> Result<String, WorldError> {
        self.register(ModuleKind::System, module)
    }

    fn register(&mut self, kind: ModuleKind, module: ModuleRef) -> Result<String, WorldError> {
        let name = self.executor()?.name(module)?;
        let policy = self.config.collision_policy;

        let registry = self.registry_mut(kind);
        let before: Option<Binding> = registry.binding(&name).cloned();
        let outcome = registry.bind(&name, module, policy)?;

        if let Rebind::Upgraded { previous } = outcome {
            debug!(%kind, %name, %previous, current = %module, "module upgraded");
            if self.is_initialized() {
                if let Err(err) = self.revalidate(kind, &name, previous, module) {
                    warn!(%kind, %name, %err, "upgrade re-validation failed, rolling back");
                    self.registry_mut(kind).restore(&name, before);
                    return Err(err);
                }
            }
        }

        self.events.push(match kind {
            ModuleKind::Component => WorldEvent::ComponentRegistered {
                name: name.clone(),
                module,
            },
            ModuleKind::System => WorldEvent::SystemRegistered {
                name: name.clone(),
                module,
            },
        });
        Ok(name)
    }

    fn registry_mut(&mut self, kind: ModuleKind) -> &mut Registry {
        match kind {
            ModuleKind::Component => &mut self.components,
            ModuleKind::System => &mut self.systems,
        }
    }

    /// Module bound to component `name`, or [`ModuleRef::ZERO`].
    #[must_use]
    pub fn component(&self, name: &str) -> ModuleRef {
        self.components.resolve(name)
    }

    /// Module bound to system `name`, or [`ModuleRef::ZERO`].
    #[must_use]
    pub fn system(&self, name: &str) -> ModuleRef {
        self.systems.resolve(name)
    }

    /// The component registry.
    #[must_use]
    pub fn components(&self) -> &Registry {
        &self.components
    }

    /// The system registry.
    #[must_use]
    pub fn systems(&self) -> &Registry {
        &self.systems
    }

    // -- Dispatch --

    /// Run the system bound to `system` with `calldata`.
    ///
    /// While the system runs it is the current caller, so entity writes it
    /// issues are attributed to it. Nested `execute` calls push their own
    /// frame and the outer caller is restored when they return. An unbound
    /// name resolves to [`ModuleRef::ZERO`], which the executor rejects.
    ///
    /// # Errors
    ///
    /// Propagates executor and module failures, and
    /// [`WorldError::CallDepthExceeded`].
    pub fn execute(&mut self, system: &str, calldata: &[u8]) -> Result<Vec<u8>, WorldError> {
        let module = self.systems.resolve(system);
        debug!(system, %module, args = calldata.len(), "execute");
        self.invoke(module, calldata, false)
    }

    /// Run `system` on behalf of the host process itself.
    ///
    /// Behaves like [`World::execute`], except that while the system's own
    /// frame is innermost, [`World::is_host_call`] reports `true`. Systems
    /// reserved for host wiring (seeding the genesis admin) check it. This
    /// must never be reachable from a remote request.
    ///
    /// # Errors
    ///
    /// Same as [`World::execute`].
    pub fn execute_as_host(
        &mut self,
        system: &str,
        calldata: &[u8],
    ) -> Result<Vec<u8>, WorldError> {
        let module = self.systems.resolve(system);
        debug!(system, %module, args = calldata.len(), "execute as host");
        self.invoke(module, calldata, true)
    }

    /// Forward `(module, calldata)` to the execution target with `module`
    /// as the current caller for the duration of the call.
    pub(crate) fn invoke(
        &mut self,
        module: ModuleRef,
        calldata: &[u8],
        host: bool,
    ) -> Result<Vec<u8>, WorldError> {
        let executor = self.executor()?;
        let depth = if host {
            self.calls.enter_host(module)?
        } else {
            self.calls.enter(module)?
        };
        let result = executor.execute(self, module, calldata);
        self.calls.exit(depth);
        result
    }

    /// The module currently executing, or [`ModuleRef::ZERO`] when idle.
    #[must_use]
    pub fn current_caller(&self) -> ModuleRef {
        self.calls.current()
    }

    /// Returns `true` while the running module was started through
    /// [`World::execute_as_host`] and has not itself called another system.
    #[must_use]
    pub fn is_host_call(&self) -> bool {
        self.calls.is_host_call()
    }

    /// Number of nested `execute` calls in progress.
    #[must_use]
    pub fn call_depth(&self) -> usize {
        self.calls.depth()
    }

    fn executor(&self) -> Result<Arc<dyn Executor>, WorldError> {
        self.executors
            .get(&self.execution_target)
            .cloned()
            .ok_or(WorldError::UnknownExecutor(self.execution_target))
    }

    // -- Administration --

    /// Make an executor available at `address`. Host wiring only; callers
    /// switch to it with [`World::set_executor`].
    pub fn attach_executor(&mut self, address: Address, executor: Arc<dyn Executor>) {
        debug!(%address, "executor attached");
        self.executors.insert(address, executor);
    }

    /// Rebind the execution target to the executor attached at `address`.
    ///
    /// # Errors
    ///
    /// [`WorldError::PermissionDenied`] unless `caller` is an admin;
    /// [`WorldError::UnknownExecutor`] if nothing is attached at `address`.
    pub fn set_executor(&mut self, caller: Address, address: Address) -> Result<(), WorldError> {
        self.ensure_admin(caller)?;
        if !self.executors.contains_key(&address) {
            return Err(WorldError::UnknownExecutor(address));
        }
        let previous = std::mem::replace(&mut self.execution_target, address);
        self.events.push(WorldEvent::ExecutorChanged {
            previous,
            current: address,
        });
        Ok(())
    }

    /// Address of the current execution target.
    #[must_use]
    pub fn executor_address(&self) -> Address {
        self.execution_target
    }

    // -- Identity --

    /// Return the next identifier and advance the sequence.
    ///
    /// # Errors
    ///
    /// [`WorldError::SequenceExhausted`] after `u64::MAX` has been issued.
    pub fn uuid(&mut self) -> Result<u64, WorldError> {
        self.sequence.next()
    }

    // -- Notifications --

    /// Remove and return every pending notification, oldest first.
    pub fn take_events(&mut self) -> Vec<WorldEvent> {
        self.events.drain()
    }

    /// Pending notifications, oldest first.
    #[must_use]
    pub fn events(&self) -> &[WorldEvent] {
        self.events.pending()
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("name", &self.config.name)
            .field("execution_target", &self.execution_target)
            .field("components", &self.components.len())
            .field("systems", &self.systems.len())
            .field("bootstrap", &self.bootstrap)
            .field("current_caller", &self.calls.current())
            .finish_non_exhaustive()
    }
}
