//! Events submitted to the engine.
//!
//! An [`Event`] is an immutable (kind, argument) pair. The kind selects the
//! class of event, the argument carries a machine-word payload whose meaning
//! is entirely application-defined.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Application-defined event class.
///
/// Kinds are small unsigned ids chosen by the embedding application.
/// [`EventKind::TIMEOUT`] is reserved for timeout events generated by the
/// engine's timeout service.
///
/// # Example
///
/// ```rust
/// use statecraft::EventKind;
///
/// const BUTTON_PRESSED: EventKind = EventKind(1);
/// const BUTTON_RELEASED: EventKind = EventKind(2);
///
/// assert_ne!(BUTTON_PRESSED, EventKind::TIMEOUT);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct EventKind(pub u8);

impl EventKind {
    /// Reserved kind for engine-generated timeout events.
    pub const TIMEOUT: EventKind = EventKind(0xFF);
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// An immutable (kind, argument) pair submitted to the engine.
///
/// # Example
///
/// ```rust
/// use statecraft::{Event, EventKind};
///
/// const SENSOR_READING: EventKind = EventKind(3);
///
/// let event = Event::new(SENSOR_READING, 42);
/// assert_eq!(event.kind, SENSOR_READING);
/// assert_eq!(event.arg, 42);
///
/// // Events without a meaningful payload carry argument 0.
/// let bare = Event::signal(SENSOR_READING);
/// assert_eq!(bare.arg, 0);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Event {
    /// Event class.
    pub kind: EventKind,
    /// Machine-word payload, application-defined.
    pub arg: usize,
}

impl Event {
    /// Create an event carrying an argument.
    pub fn new(kind: EventKind, arg: usize) -> Self {
        Self { kind, arg }
    }

    /// Create an event with no payload (argument 0).
    pub fn signal(kind: EventKind) -> Self {
        Self { kind, arg: 0 }
    }
}

/// A queued event with the time left before it becomes due.
///
/// Delays are tracked in microseconds and decremented by the elapsed time of
/// each engine tick until they reach zero.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DeferredEvent {
    pub event: Event,
    pub remaining_micros: u64,
}
