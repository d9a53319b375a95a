//! # world_core
//!
//! Registry and dispatch core of the ECS world.
//!
//! A [`World`] maps component and system names to content-addressed module
//! references, runs systems through a pluggable [`Executor`], gates a
//! one-shot authorization bootstrap behind the `Admin` role, and forwards
//! entity reads and writes to a [`Database`].
//!
//! ```text
//! caller ──► World::execute ──► Executor ──► module logic
//!                                               │
//!              World::set_entity ◄──────────────┘
//!                     │
//!                     ▼
//!                 Database
//! ```

pub mod bootstrap;
pub mod calls;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
mod gateway;
pub mod registry;
pub mod sequence;
pub mod storage;
pub mod world;

pub use bootstrap::BootstrapState;
pub use calls::CallStack;
pub use config::{DEFAULT_MAX_CALL_DEPTH, WorldConfig};
pub use error::WorldError;
pub use events::{EventQueue, WorldEvent};
pub use executor::{ComponentSchema, Executor, Module, ModuleHost, SystemFn};
pub use registry::{Binding, CollisionPolicy, ModuleKind, Rebind, Registry};
pub use sequence::IdSequence;
pub use storage::{DEFAULT_MAX_FIELDS, Database, MemoryDatabase, StorageError};
pub use world::World;

use world_types::{Field, short_string};

/// Component whose first field holds an account's role.
pub const ROLE_COMPONENT: &str = "Role";

/// System that receives every route during bootstrap.
pub const ROUTE_AUTH_SYSTEM: &str = "RouteAuth";

/// `Role` value that passes the admin check.
pub const ADMIN_ROLE: Field = match short_string("Admin") {
    Some(role) => role,
    None => panic!("role name longer than a field"),
};
