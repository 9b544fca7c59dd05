//! Statecraft: a bounded-memory hierarchical state machine engine.
//!
//! Statecraft dispatches timed and immediate events against a set of
//! registered states, switches the active state according to transition
//! rules, and remembers a stack of suspended states for push/pop-style
//! nesting. Memory is bounded throughout: the deferred-event queue and the
//! state stack both have fixed capacities, and capacity exhaustion is a
//! reportable condition, never a fault.
//!
//! # Core Concepts
//!
//! - **[`StateHandler`]**: the capability bundle every state implements —
//!   lifecycle (`begin`/`end`), activation (`enter`/`exit`), per-tick
//!   `update`, and a pure `on_event` decision function
//! - **[`Response`]**: what should happen to an event — unhandled, handled,
//!   switch, push, or pop
//! - **[`TransitionTable`]**: ordered first-match-wins rules with wildcard
//!   arguments and per-state scoping
//! - **[`Engine`]**: the dispatch loop — drains due events each tick,
//!   resolves them (engine hook first, then the active state), and applies
//!   the outcome
//! - **[`EventSender`]**: cloneable handle for submitting events from any
//!   thread
//!
//! # Example
//!
//! ```rust
//! use statecraft::{
//!     Engine, Event, EventKind, Response, Rule, StateBuilder, StateId, TransitionTable,
//! };
//!
//! const IDLE: StateId = StateId(1);
//! const RUNNING: StateId = StateId(2);
//! const START: EventKind = EventKind(1);
//! const FINISH: EventKind = EventKind(2);
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = Engine::builder()
//!     .state(
//!         StateBuilder::new(IDLE, "idle")
//!             .table(TransitionTable::new().rule(Rule::on(START).switch_to(RUNNING)))
//!             .build()?,
//!     )
//!     .state(
//!         StateBuilder::new(RUNNING, "running")
//!             .table(TransitionTable::new().rule(Rule::on(FINISH).switch_to(IDLE)))
//!             .build()?,
//!     )
//!     .build()?;
//!
//! engine.begin_at(IDLE)?;
//! engine.send_event(Event::signal(START))?;
//! engine.update()?;
//! assert_eq!(engine.active_id(), RUNNING);
//!
//! engine.send_event(Event::signal(FINISH))?;
//! engine.update()?;
//! assert_eq!(engine.active_id(), IDLE);
//!
//! engine.end();
//! # Ok(())
//! # }
//! ```
//!
//! # Threading
//!
//! One logical thread owns [`Engine::update`]/[`Engine::run`] and all state
//! mutation. Any number of other threads submit events through
//! [`Engine::sender`] handles; submission is the only cross-thread
//! operation. An idle `update()` can park on the queue's condition variable
//! for the configured wait timeout instead of busy-looping.

pub mod builder;
pub mod core;
pub mod engine;

// Re-export the public surface at the crate root.
pub use crate::core::{
    Event, EventKind, InitError, Response, Rule, StateHandler, StateId, TransitionTable,
};
pub use builder::{BuildError, ClosureState, EngineBuilder, StateBuilder};
pub use engine::{
    Clock, Context, Engine, EngineError, EventSender, MonotonicClock, SendError,
};
