//! World error types.

use world_types::{Address, CodecError, ModuleRef};

use crate::registry::ModuleKind;
use crate::storage::StorageError;

/// Errors surfaced by world operations.
///
/// Absent registry entries and absent storage values are not errors: lookups
/// return [`ModuleRef::ZERO`] and reads return an empty buffer. Collaborator
/// failures ([`WorldError::Storage`], [`WorldError::Codec`],
/// [`WorldError::Module`]) are propagated unchanged to the original caller.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The caller's `Role` component does not read `Admin`.
    #[error("permission denied: {caller} is not an admin")]
    PermissionDenied { caller: Address },

    /// The bootstrap already ran (or is running).
    #[error("world is already initialized")]
    AlreadyInitialized,

    /// The executor has no module with this reference.
    #[error("module {0} not found")]
    ModuleNotFound(ModuleRef),

    /// A name is already bound and the collision policy rejects rebinding.
    #[error("{kind} name '{name}' is already bound to {module}")]
    NameTaken {
        kind: ModuleKind,
        name: String,
        module: ModuleRef,
    },

    /// No executor is attached at the execution target address.
    #[error("no executor attached at {0}")]
    UnknownExecutor(Address),

    /// The module exists but has no callable entry point (e.g. a component).
    #[error("module {0} is not callable")]
    NotCallable(ModuleRef),

    /// Nested `execute` calls went deeper than the configured limit.
    #[error("call depth limit of {0} exceeded")]
    CallDepthExceeded(usize),

    /// Every identifier of the sequence has been issued.
    #[error("id sequence exhausted")]
    SequenceExhausted,

    /// A module's own logic failed.
    #[error("module {module} failed: {reason}")]
    Module { module: ModuleRef, reason: String },

    /// The storage engine failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An argument or result buffer could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl WorldError {
    /// Convenience constructor for failures raised inside module logic.
    #[must_use]
    pub fn module(module: ModuleRef, reason: impl Into<String>) -> Self {
        Self::Module {
            module,
            reason: reason.into(),
        }
    }
}
