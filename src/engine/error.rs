//! Engine error taxonomy.
//!
//! Every failure here is local and recoverable: the engine stays operable
//! after any of them except [`EngineError::InitFailed`], which leaves the
//! engine partially initialized and unfit for `update()`.

use crate::core::{InitError, StateId};
use thiserror::Error;

/// Failure to submit an event.
#[derive(Debug, Error)]
pub enum SendError {
    /// The deferred-event queue is at capacity. The call had no side
    /// effects; the caller may retry after the engine drains.
    #[error("event queue is full (capacity {capacity})")]
    QueueFull {
        /// Configured queue capacity.
        capacity: usize,
    },
}

/// Failure of an engine operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Switch or push target not present in the registry.
    #[error("no state registered under id {0}")]
    UnknownState(StateId),

    /// Switch target equals the active identity; defined as a no-op
    /// failure, never invokes exit/enter.
    #[error("state {0} is already active")]
    AlreadyActive(StateId),

    /// Switch target was the "none" sentinel, which means "stay".
    #[error("cannot switch to the none sentinel")]
    NoTarget,

    /// Pop requested with nothing on the state stack.
    #[error("state stack is empty")]
    EmptyStack,

    /// Push would exceed the state stack capacity.
    #[error("state stack is full (capacity {capacity})")]
    StackFull {
        /// Configured stack capacity.
        capacity: usize,
    },

    /// A state is already registered under this identity.
    #[error("a state is already registered under id {0}")]
    DuplicateState(StateId),

    /// Neither the handler nor the registration call supplied an identity.
    #[error("state '{name}' has no id; supply one at registration")]
    MissingId {
        /// Name of the handler that could not be registered.
        name: String,
    },

    /// A state's one-time initialization failed; the startup broadcast was
    /// aborted and the engine must not be updated.
    #[error("state '{state}' failed to initialize: {source}")]
    InitFailed {
        /// Name of the failing state (or "engine" for the begin hook).
        state: String,
        /// The underlying initialization failure.
        #[source]
        source: InitError,
    },

    /// `update()` called before a successful `begin()`.
    #[error("engine has not been started; call begin() first")]
    NotStarted,
}
