//! Permission grants activated during bootstrap.
//!
//! The world treats a [`Route`] as an opaque serialisable value: it encodes
//! each route and hands the buffer to the `RouteAuth` system, which owns the
//! meaning of the fields.

use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use crate::module_ref::ModuleRef;

/// Access bits granted to a system over a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Permission(pub u8);

impl Permission {
    /// No access.
    pub const NONE: Permission = Permission(0);
    /// May read entity values.
    pub const READ: Permission = Permission(1);
    /// May write entity values.
    pub const WRITE: Permission = Permission(1 << 1);
    /// May delete entity values.
    pub const DELETE: Permission = Permission(1 << 2);
    /// Every access bit.
    pub const ALL: Permission = Permission(0b111);

    /// Returns `true` if every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Permission) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Permission {
    type Output = Permission;

    fn bitor(self, rhs: Permission) -> Permission {
        Permission(self.0 | rhs.0)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |bit: Permission, c: char| if self.contains(bit) { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(Permission::READ, 'r'),
            flag(Permission::WRITE, 'w'),
            flag(Permission::DELETE, 'd')
        )
    }
}

/// A grant of `permission` on `component` to the system named `system`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Module reference of the component being granted.
    pub component: ModuleRef,
    /// Name of the system receiving the grant.
    pub system: String,
    /// The access being granted.
    pub permission: Permission,
}

impl Route {
    /// Create a new route.
    #[must_use]
    pub fn new(component: ModuleRef, system: impl Into<String>, permission: Permission) -> Self {
        Self {
            component,
            system: system.into(),
            permission,
        }
    }
}
