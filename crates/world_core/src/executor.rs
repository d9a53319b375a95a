//! Execution-indirection target and the in-process module host.
//!
//! The world never calls module logic directly. It hands a module reference
//! and an argument buffer to an [`Executor`], which owns the modules and
//! runs them. This is what lets a name be rebound to new logic without
//! anything that already holds the world having to change.
//!
//! [`ModuleHost`] is the executor shipped with the crate: modules are Rust
//! values implementing [`Module`], addressed by the SHA-256 of the artifact
//! bytes they report.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use world_types::ModuleRef;

use crate::error::WorldError;
use crate::world::World;

/// The collaborator that runs module logic on the world's behalf.
///
/// Calls are synchronous. `execute` receives the world mutably so the
/// module can read and write entities (and even `execute` other systems)
/// while it runs.
pub trait Executor: Send + Sync {
    /// Ask a module for its canonical name.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ModuleNotFound`] for unknown references.
    fn name(&self, module: ModuleRef) -> Result<String, WorldError>;

    /// Run a module with an argument buffer and return its result buffer.
    ///
    /// # Errors
    ///
    /// Propagates whatever the module returns; unknown references yield
    /// [`WorldError::ModuleNotFound`].
    fn execute(
        &self,
        world: &mut World,
        module: ModuleRef,
        calldata: &[u8],
    ) -> Result<Vec<u8>, WorldError>;
}

/// A unit of logic installable into a [`ModuleHost`].
pub trait Module: Send + Sync {
    /// The canonical name the module registers under.
    fn name(&self) -> &str;

    /// Bytes identifying this exact version of the module's logic. The
    /// module reference is their SHA-256.
    fn artifact(&self) -> Vec<u8>;

    /// Entry point invoked through `World::execute`. Components have none.
    ///
    /// # Errors
    ///
    /// Module-specific.
    fn call(&self, world: &mut World, calldata: &[u8]) -> Result<Vec<u8>, WorldError> {
        let _ = (world, calldata);
        Err(WorldError::NotCallable(ModuleRef::from_artifact(
            &self.artifact(),
        )))
    }
}

/// A component schema: a name and its ordered field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSchema {
    /// Component name.
    pub name: String,
    /// Field names, in storage order.
    pub fields: Vec<String>,
}

impl ComponentSchema {
    /// Create a schema.
    #[must_use]
    pub fn new(name: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            name: name.into(),
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
        }
    }
}

impl Module for ComponentSchema {
    fn name(&self) -> &str {
        &self.name
    }

    fn artifact(&self) -> Vec<u8> {
        // Field order is part of the identity: reordering moves offsets.
        let mut bytes = b"component:".to_vec();
        bytes.extend_from_slice(self.name.as_bytes());
        for field in &self.fields {
            bytes.push(0);
            bytes.extend_from_slice(field.as_bytes());
        }
        bytes
    }
}

type SystemBody = dyn Fn(&mut World, &[u8]) -> Result<Vec<u8>, WorldError> + Send + Sync;

/// A system whose logic is a closure.
///
/// `revision` stands in for the compiled artifact: bump it to model an
/// upgraded version of the same system.
pub struct SystemFn {
    name: String,
    revision: String,
    body: Box<SystemBody>,
}

impl SystemFn {
    /// Create a system from a closure.
    pub fn new<F>(name: impl Into<String>, revision: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut World, &[u8]) -> Result<Vec<u8>, WorldError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            revision: revision.into(),
            body: Box::new(body),
        }
    }
}

impl fmt::Debug for SystemFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemFn")
            .field("name", &self.name)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl Module for SystemFn {
    fn name(&self) -> &str {
        &self.name
    }

    fn artifact(&self) -> Vec<u8> {
        format!("system:{}:{}", self.name, self.revision).into_bytes()
    }

    fn call(&self, world: &mut World, calldata: &[u8]) -> Result<Vec<u8>, WorldError> {
        (self.body)(world, calldata)
    }
}

/// In-process [`Executor`] holding installed modules by reference.
#[derive(Default)]
pub struct ModuleHost {
    modules: DashMap<ModuleRef, Arc<dyn Module>>,
}

impl ModuleHost {
    /// Create an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a module and return its content-addressed reference.
    ///
    /// Installing identical logic twice yields the same reference.
    pub fn install(&self, module: impl Module + 'static) -> ModuleRef {
        self.install_arc(Arc::new(module))
    }

    /// Install a shared module.
    pub fn install_arc(&self, module: Arc<dyn Module>) -> ModuleRef {
        let reference = ModuleRef::from_artifact(&module.artifact());
        debug!(name = module.name(), module = %reference, "module installed");
        self.modules.insert(reference, module);
        reference
    }

    /// Returns `true` if a module with this reference is installed.
    #[must_use]
    pub fn contains(&self, module: ModuleRef) -> bool {
        self.modules.contains_key(&module)
    }

    /// Number of installed modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if nothing is installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn lookup(&self, module: ModuleRef) -> Result<Arc<dyn Module>, WorldError> {
        // Clone out of the map so no shard guard is held while the module
        // runs and re-enters the host.
        self.modules
            .get(&module)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(WorldError::ModuleNotFound(module))
    }
}

impl fmt::Debug for ModuleHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHost")
            .field("modules", &self.modules.len())
            .finish()
    }
}

impl Executor for ModuleHost {
    fn name(&self, module: ModuleRef) -> Result<String, WorldError> {
        Ok(self.lookup(module)?.name().to_string())
    }

    fn execute(
        &self,
        world: &mut World,
        module: ModuleRef,
        calldata: &[u8],
    ) -> Result<Vec<u8>, WorldError> {
        let logic = self.lookup(module)?;
        logic.call(world, calldata)
    }
}
