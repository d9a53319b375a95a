//! # world_types
//!
//! Value types shared by every part of the ECS world.
//!
//! This crate provides:
//!
//! - [`ModuleRef`] - content-addressed identity of a component schema or
//!   system module.
//! - [`Address`], [`Entity`], [`Partition`] - plain integer identifiers.
//! - [`Query`] and [`TableId`] - the entity addressing scheme used by the
//!   storage gateway.
//! - [`Route`] and [`Permission`] - grant records processed at bootstrap.
//! - [`Field`] and short-string helpers for component values.
//! - [`codec`] - MessagePack helpers for argument and result buffers.

pub mod address;
pub mod codec;
pub mod error;
pub mod field;
pub mod hash;
pub mod module_ref;
pub mod query;
pub mod route;

pub use address::{Address, Entity, Partition};
pub use codec::{decode, encode};
pub use error::CodecError;
pub use field::{Field, short_string, short_string_lossy};
pub use module_ref::ModuleRef;
pub use query::{Query, TableId};
pub use route::{Permission, Route};
