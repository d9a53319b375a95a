//! Invocation context: the stack of modules currently executing.
//!
//! Every `execute` pushes the resolved module on entry and truncates back to
//! the depth it saw on exit, so the current caller is always the innermost
//! running module and a nested call can never leave a stale identity behind.
//!
//! A frame also records whether the host process opened it directly. Only
//! the outermost frame of a host call carries that mark; anything the module
//! executes from there is an ordinary call.

use world_types::ModuleRef;

use crate::error::WorldError;

#[derive(Debug, Clone, Copy)]
struct Frame {
    module: ModuleRef,
    host: bool,
}

/// Stack of executing modules, innermost last.
#[derive(Debug, Clone)]
pub struct CallStack {
    frames: Vec<Frame>,
    max_depth: usize,
}

impl CallStack {
    /// Create an empty stack that refuses to grow beyond `max_depth` frames.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push `module` and return the depth to hand back to [`CallStack::exit`].
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CallDepthExceeded`] if the stack is full.
    pub fn enter(&mut self, module: ModuleRef) -> Result<usize, WorldError> {
        self.push(Frame {
            module,
            host: false,
        })
    }

    /// Like [`CallStack::enter`], but marks the frame as opened by the host.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CallDepthExceeded`] if the stack is full.
    pub fn enter_host(&mut self, module: ModuleRef) -> Result<usize, WorldError> {
        self.push(Frame { module, host: true })
    }

    fn push(&mut self, frame: Frame) -> Result<usize, WorldError> {
        if self.frames.len() >= self.max_depth {
            return Err(WorldError::CallDepthExceeded(self.max_depth));
        }
        let depth = self.frames.len();
        self.frames.push(frame);
        Ok(depth)
    }

    /// Pop back to `depth`, discarding any frames a failed nested call left.
    pub fn exit(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    /// The innermost executing module, or [`ModuleRef::ZERO`] when idle.
    #[must_use]
    pub fn current(&self) -> ModuleRef {
        self.frames.last().map_or(ModuleRef::ZERO, |frame| frame.module)
    }

    /// Returns `true` if the innermost frame was opened by the host.
    #[must_use]
    pub fn is_host_call(&self) -> bool {
        self.frames.last().is_some_and(|frame| frame.host)
    }

    /// Number of active frames.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
