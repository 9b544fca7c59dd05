//! Pure data model of the engine.
//!
//! This module contains the types with no engine machinery attached:
//! - events and their identities
//! - state identities and the [`StateHandler`] capability contract
//! - transition tables resolved as pure functions
//!
//! Everything here is decision logic; applying the decisions (switching,
//! pushing, popping, queueing) lives in [`crate::engine`].

mod event;
mod state;
mod table;

pub use event::{Event, EventKind};
pub use state::{InitError, Response, StateHandler, StateId};
pub use table::{Rule, TransitionTable};

pub(crate) use event::DeferredEvent;
