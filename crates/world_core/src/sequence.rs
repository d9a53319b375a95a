//! Identifier sequence behind `uuid()`.

use crate::error::WorldError;

/// Issues monotonically increasing identifiers with no gaps and no reuse.
///
/// Identifiers are unique only within one world; two worlds configured with
/// the same first id will hand out the same values.
#[derive(Debug, Clone)]
pub struct IdSequence {
    next_id: Option<u64>,
}

impl IdSequence {
    /// Creates a sequence whose first identifier is `first`.
    #[must_use]
    pub fn new(first: u64) -> Self {
        Self {
            next_id: Some(first),
        }
    }

    /// Returns the next identifier and advances the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::SequenceExhausted`] once `u64::MAX` has been
    /// issued.
    pub fn next(&mut self) -> Result<u64, WorldError> {
        let id = self.next_id.ok_or(WorldError::SequenceExhausted)?;
        self.next_id = id.checked_add(1);
        Ok(id)
    }

    /// The identifier the next call will return, if any remain.
    #[must_use]
    pub fn peek(&self) -> Option<u64> {
        self.next_id
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new(0)
    }
}
