//! Builder for configuring engines.

use crate::builder::error::BuildError;
use crate::core::{Event, InitError, Response, StateHandler, StateId};
use crate::engine::{
    Clock, Engine, EngineHooks, MonotonicClock, DEFAULT_QUEUE_CAPACITY, DEFAULT_STACK_CAPACITY,
};
use std::time::Duration;

/// Builder for engines with a fluent API.
///
/// # Example
///
/// ```rust
/// use statecraft::{Engine, Response, StateBuilder, StateId};
/// use std::time::Duration;
///
/// const IDLE: StateId = StateId(1);
///
/// let engine = Engine::builder()
///     .state(StateBuilder::new(IDLE, "idle").build().unwrap())
///     .queue_capacity(32)
///     .wait_timeout(Duration::from_millis(100))
///     .build()
///     .unwrap();
/// ```
pub struct EngineBuilder {
    states: Vec<(Box<dyn StateHandler>, StateId)>,
    queue_capacity: usize,
    stack_capacity: usize,
    wait_timeout: Duration,
    clock: Option<Box<dyn Clock>>,
    hooks: EngineHooks,
}

impl EngineBuilder {
    /// Create a builder with default capacities.
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            stack_capacity: DEFAULT_STACK_CAPACITY,
            wait_timeout: Duration::ZERO,
            clock: None,
            hooks: EngineHooks::default(),
        }
    }

    /// Register a state under the identity it reports.
    pub fn state(mut self, unit: impl StateHandler + 'static) -> Self {
        self.states.push((Box::new(unit), StateId::NONE));
        self
    }

    /// Register a state, supplying the identity for handlers that report
    /// the sentinel.
    pub fn state_with_id(mut self, unit: impl StateHandler + 'static, id: StateId) -> Self {
        self.states.push((Box::new(unit), id));
        self
    }

    /// Deferred-event queue capacity (default 10).
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Saved-state stack capacity (default 8).
    pub fn stack_capacity(mut self, capacity: usize) -> Self {
        self.stack_capacity = capacity;
        self
    }

    /// How long an idle `update()` parks waiting for events (default: does
    /// not park).
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Substitute the time source (default: monotonic system clock).
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Engine-level initialization hook, run by `begin()` before the state
    /// broadcast; a failure aborts startup.
    pub fn on_begin(
        mut self,
        hook: impl FnMut() -> Result<(), InitError> + Send + 'static,
    ) -> Self {
        self.hooks.on_begin = Some(Box::new(hook));
        self
    }

    /// Hook run at the top of every `update()` tick.
    pub fn on_tick(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.hooks.on_tick = Some(Box::new(hook));
        self
    }

    /// Engine-level event hook; resolves every due event before the active
    /// state is consulted.
    pub fn on_event(
        mut self,
        hook: impl FnMut(StateId, &Event) -> Response + Send + 'static,
    ) -> Self {
        self.hooks.on_event = Some(Box::new(hook));
        self
    }

    /// Teardown hook, run by `end()` after the state broadcast.
    pub fn on_end(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.hooks.on_end = Some(Box::new(hook));
        self
    }

    /// Build the engine and register the collected states.
    pub fn build(self) -> Result<Engine, BuildError> {
        if self.queue_capacity == 0 {
            return Err(BuildError::ZeroQueueCapacity);
        }
        if self.stack_capacity == 0 {
            return Err(BuildError::ZeroStackCapacity);
        }
        let clock = self
            .clock
            .unwrap_or_else(|| Box::new(MonotonicClock::new()));
        let mut engine = Engine::with_config(
            self.queue_capacity,
            self.stack_capacity,
            self.wait_timeout,
            clock,
            self.hooks,
        );
        for (unit, id) in self.states {
            engine.register(unit, id)?;
        }
        Ok(engine)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
