//! Module registry: name to module reference bindings.
//!
//! The world keeps two registries of the same shape, one for components and
//! one for systems. Each binding carries a version that increases every time
//! the name is rebound to a different module, so an upgrade is observable
//! and can trigger permission re-validation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use world_types::ModuleRef;

use crate::error::WorldError;

/// Which registry a binding lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    /// A data schema provider.
    Component,
    /// A behaviour provider.
    System,
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleKind::Component => f.write_str("component"),
            ModuleKind::System => f.write_str("system"),
        }
    }
}

/// What to do when a name that is already bound is registered again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Rebind the name to the new module and bump its version.
    #[default]
    Upgrade,
    /// Refuse with [`WorldError::NameTaken`].
    Reject,
}

/// A versioned name → module binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// The canonical name the module reported.
    pub name: String,
    /// The module currently bound to the name.
    pub module: ModuleRef,
    /// Starts at 1, incremented on every upgrade.
    pub version: u32,
}

/// Outcome of [`Registry::bind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rebind {
    /// The name was not bound before.
    Fresh,
    /// The name was already bound to this exact module.
    Unchanged,
    /// The name moved from `previous` to the new module.
    Upgraded { previous: ModuleRef },
}

/// Registry of one kind of module, keyed by name.
#[derive(Debug, Clone)]
pub struct Registry {
    kind: ModuleKind,
    bindings: BTreeMap<String, Binding>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(kind: ModuleKind) -> Self {
        Self {
            kind,
            bindings: BTreeMap::new(),
        }
    }

    /// Returns which kind of module this registry holds.
    #[must_use]
    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    /// Bind `name` to `module` according to `policy`.
    ///
    /// Rebinding a name to the module it already points at is a no-op under
    /// either policy.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NameTaken`] if the name is bound to a different
    /// module and `policy` is [`CollisionPolicy::Reject`].
    pub fn bind(
        &mut self,
        name: &str,
        module: ModuleRef,
        policy: CollisionPolicy,
    ) -> Result<Rebind, WorldError> {
        let Some(existing) = self.bindings.get_mut(name) else {
            self.bindings.insert(
                name.to_string(),
                Binding {
                    name: name.to_string(),
                    module,
                    version: 1,
                },
            );
            return Ok(Rebind::Fresh);
        };

        if existing.module == module {
            return Ok(Rebind::Unchanged);
        }

        match policy {
            CollisionPolicy::Reject => Err(WorldError::NameTaken {
                kind: self.kind,
                name: name.to_string(),
                module: existing.module,
            }),
            CollisionPolicy::Upgrade => {
                let previous = existing.module;
                existing.module = module;
                existing.version += 1;
                Ok(Rebind::Upgraded { previous })
            }
        }
    }

    /// Put a binding back the way it was before a failed upgrade. `None`
    /// removes the name entirely.
    pub fn restore(&mut self, name: &str, previous: Option<Binding>) {
        match previous {
            Some(binding) => {
                self.bindings.insert(name.to_string(), binding);
            }
            None => {
                self.bindings.remove(name);
            }
        }
    }

    /// Resolve a name, returning [`ModuleRef::ZERO`] when it is not bound.
    #[must_use]
    pub fn resolve(&self, name: &str) -> ModuleRef {
        self.bindings
            .get(name)
            .map_or(ModuleRef::ZERO, |binding| binding.module)
    }

    /// Returns the full binding record for a name.
    #[must_use]
    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Returns all bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }

    /// Returns the number of bound names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if no names are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
