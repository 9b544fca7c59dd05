//! State identities and the state capability contract.
//!
//! A state is anything implementing [`StateHandler`]: a bundle of lifecycle
//! callbacks (`begin`/`end`), activation callbacks (`enter`/`exit`), a
//! per-tick `update`, and a pure `on_event` decision function. States never
//! change the machine as a side effect — they *request* changes by returning
//! a [`Response`], which the engine applies.

use crate::core::event::Event;
use crate::engine::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identity of a registered state.
///
/// Identities are small unsigned ids, unique within one engine.
/// [`StateId::NONE`] is the reserved sentinel meaning "no state": it never
/// identifies a real state, and as a transition target it means "stay".
///
/// # Example
///
/// ```rust
/// use statecraft::StateId;
///
/// const IDLE: StateId = StateId(0);
/// const RUNNING: StateId = StateId(1);
///
/// assert!(!IDLE.is_none());
/// assert!(StateId::NONE.is_none());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct StateId(pub u8);

impl StateId {
    /// Reserved sentinel meaning "no state" / "stay".
    pub const NONE: StateId = StateId(0xFF);

    /// Check whether this is the reserved sentinel.
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "none")
        } else {
            write!(f, "0x{:02X}", self.0)
        }
    }
}

/// Outcome of resolving one event.
///
/// Returned by [`StateHandler::on_event`], by the engine-level event hook,
/// and by transition table rules. The engine applies `Switch`/`Push`/`Pop`
/// outcomes; `Handled` consumes the event without moving; `Unhandled` passes
/// the event to the next resolver in priority order (and ultimately drops
/// it).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Response {
    /// The resolver does not recognize this event.
    Unhandled,
    /// The event is consumed; the active state does not change.
    Handled,
    /// Switch the active state to the given target.
    Switch(StateId),
    /// Save the active state on the stack, then switch to the given target.
    Push(StateId),
    /// Return to the most recently pushed state.
    Pop,
}

/// Failure reported by a state's one-time initialization.
///
/// A `begin` failure aborts engine startup; see
/// [`EngineError::InitFailed`](crate::EngineError::InitFailed).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct InitError(String);

impl InitError {
    /// Create an initialization error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The capability bundle implemented by every state.
///
/// All callbacks have no-op defaults, so a state only implements what it
/// needs. `enter`, `update` and `exit` receive a [`Context`] handle for the
/// operations a state may delegate to its engine (event submission, timeout
/// queries, cooperative stop); `on_event` is a pure decision function with
/// no engine access.
///
/// # Example
///
/// ```rust
/// use statecraft::{Event, EventKind, Response, StateHandler, StateId};
///
/// const DOOR_OPEN: StateId = StateId(1);
/// const DOOR_CLOSED: StateId = StateId(2);
/// const EVENT_CLOSE: EventKind = EventKind(1);
///
/// struct OpenDoor;
///
/// impl StateHandler for OpenDoor {
///     fn id(&self) -> StateId {
///         DOOR_OPEN
///     }
///
///     fn name(&self) -> &str {
///         "open"
///     }
///
///     fn on_event(&self, event: &Event) -> Response {
///         match event.kind {
///             EVENT_CLOSE => Response::Switch(DOOR_CLOSED),
///             _ => Response::Unhandled,
///         }
///     }
/// }
/// ```
pub trait StateHandler: Send {
    /// Identity under which this state registers.
    ///
    /// Return [`StateId::NONE`] to accept the id supplied at registration;
    /// a concrete id returned here wins over the registration argument
    /// (first assignment wins).
    fn id(&self) -> StateId {
        StateId::NONE
    }

    /// Human-readable name used in diagnostics.
    fn name(&self) -> &str;

    /// One-time initialization, broadcast by the engine's `begin()`.
    ///
    /// A failure aborts the rest of the startup broadcast.
    fn begin(&mut self) -> Result<(), InitError> {
        Ok(())
    }

    /// Teardown, broadcast by the engine's `end()`. Always called,
    /// non-failing.
    fn end(&mut self) {}

    /// Called when this state becomes active.
    ///
    /// `event` is the triggering event, or `None` when the state was
    /// activated by `begin_at`.
    fn enter(&mut self, _ctx: &mut Context, _event: Option<&Event>) {}

    /// Called once per engine tick while this state is active.
    fn update(&mut self, _ctx: &mut Context) {}

    /// Called when this state stops being active.
    ///
    /// `event` is the triggering event, or `None` at engine teardown.
    fn exit(&mut self, _ctx: &mut Context, _event: Option<&Event>) {}

    /// Pure decision function: what should happen to this event?
    ///
    /// Must not mutate unrelated state. The default leaves every event
    /// unhandled.
    fn on_event(&self, _event: &Event) -> Response {
        Response::Unhandled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::EventKind;

    struct Minimal;

    impl StateHandler for Minimal {
        fn name(&self) -> &str {
            "minimal"
        }
    }

    #[test]
    fn defaults_leave_events_unhandled() {
        let state = Minimal;
        assert_eq!(state.id(), StateId::NONE);
        assert_eq!(
            state.on_event(&Event::signal(EventKind(1))),
            Response::Unhandled
        );
    }

    #[test]
    fn default_begin_succeeds() {
        let mut state = Minimal;
        assert!(state.begin().is_ok());
    }

    #[test]
    fn sentinel_never_identifies_a_state() {
        assert!(StateId::NONE.is_none());
        assert!(!StateId(0).is_none());
        assert!(!StateId(0xFE).is_none());
    }

    #[test]
    fn state_id_display_names_the_sentinel() {
        assert_eq!(StateId::NONE.to_string(), "none");
        assert_eq!(StateId(0x0A).to_string(), "0x0A");
    }

    #[test]
    fn response_roundtrips_through_json() {
        let response = Response::Push(StateId(3));
        let json = serde_json::to_string(&response).unwrap();
        let back: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(response, back);
    }
}
