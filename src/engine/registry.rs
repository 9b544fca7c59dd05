//! Ordered collection of registered states.
//!
//! Registration order matters: lifecycle broadcasts (`begin`/`end`) walk
//! the registry in the order states were added. Identities are fixed at
//! registration and unique within one registry.

use crate::core::{StateHandler, StateId};
use crate::engine::error::EngineError;

struct Entry {
    id: StateId,
    unit: Box<dyn StateHandler>,
}

#[derive(Default)]
pub(crate) struct StateRegistry {
    entries: Vec<Entry>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state under the identity it reports, falling back to
    /// `fallback` when the handler reports the sentinel. The handler's own
    /// id wins (first assignment wins); duplicates and missing ids are
    /// rejected.
    pub fn add(
        &mut self,
        unit: Box<dyn StateHandler>,
        fallback: StateId,
    ) -> Result<StateId, EngineError> {
        let id = if unit.id().is_none() {
            fallback
        } else {
            unit.id()
        };
        if id.is_none() {
            return Err(EngineError::MissingId {
                name: unit.name().to_string(),
            });
        }
        if self.index_of(id).is_some() {
            return Err(EngineError::DuplicateState(id));
        }
        self.entries.push(Entry { id, unit });
        Ok(id)
    }

    pub fn index_of(&self, id: StateId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    pub fn id_at(&self, index: usize) -> StateId {
        self.entries[index].id
    }

    pub fn unit(&self, index: usize) -> &dyn StateHandler {
        self.entries[index].unit.as_ref()
    }

    pub fn unit_mut(&mut self, index: usize) -> &mut dyn StateHandler {
        self.entries[index].unit.as_mut()
    }

    pub fn by_id(&self, id: StateId) -> Option<&dyn StateHandler> {
        self.index_of(id).map(|index| self.unit(index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
