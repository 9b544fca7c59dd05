//! Bounded LIFO of saved state identities for push/pop nesting.

use crate::core::StateId;
use crate::engine::error::EngineError;

/// Saved-state stack. Mutated only by the engine thread; a failed push or
/// pop leaves the depth unchanged.
#[derive(Debug)]
pub(crate) struct StateStack {
    slots: Vec<StateId>,
    capacity: usize,
}

impl StateStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, id: StateId) -> Result<(), EngineError> {
        if self.slots.len() >= self.capacity {
            return Err(EngineError::StackFull {
                capacity: self.capacity,
            });
        }
        self.slots.push(id);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<StateId> {
        self.slots.pop()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
