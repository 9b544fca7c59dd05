//! The dispatch engine.
//!
//! The [`Engine`] owns the active-state reference, the deferred-event
//! queue, the saved-state stack and the engine-level hooks. One logical
//! thread drives `update()`/`run()`; any number of threads submit events
//! through [`EventSender`] handles.
//!
//! Each tick: run the tick hook, optionally park until an event arrives,
//! drain the queue entries whose delay has decayed, resolve each due event
//! (engine hook first, then the active state), apply the resulting
//! transition, and finally call `update` on the active state exactly once.

mod clock;
mod error;
mod queue;
mod registry;
mod stack;

pub use clock::{Clock, MonotonicClock};
pub use error::{EngineError, SendError};
pub use queue::EventSender;

use crate::core::{Event, EventKind, InitError, Response, StateHandler, StateId};
use queue::SharedQueue;
use registry::StateRegistry;
use stack::StateStack;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Default deferred-event queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;
/// Default saved-state stack capacity.
pub const DEFAULT_STACK_CAPACITY: usize = 8;

pub(crate) type BeginHook = Box<dyn FnMut() -> Result<(), InitError> + Send>;
pub(crate) type TickHook = Box<dyn FnMut() + Send>;
pub(crate) type EventHook = Box<dyn FnMut(StateId, &Event) -> Response + Send>;
pub(crate) type EndHook = Box<dyn FnMut() + Send>;

/// Optional engine-level closures, run around the state lifecycle.
#[derive(Default)]
pub(crate) struct EngineHooks {
    pub on_begin: Option<BeginHook>,
    pub on_tick: Option<TickHook>,
    pub on_event: Option<EventHook>,
    pub on_end: Option<EndHook>,
}

/// Engine handle passed to state callbacks.
///
/// Carries the operations a state may delegate to its engine: event
/// submission, residency-timeout queries, and cooperative stop. The handle
/// is rebuilt per callback; states never hold a reference back into the
/// engine.
pub struct Context {
    sender: EventSender,
    active: StateId,
    now_micros: u64,
    entered_micros: u64,
}

impl Context {
    /// Submit an event for the next engine tick.
    pub fn send_event(&self, event: Event) -> Result<(), SendError> {
        self.sender.send(event)
    }

    /// Submit an event to be dispatched no earlier than `delay_ms` from now.
    pub fn send_delayed_event(&self, event: Event, delay_ms: u32) -> Result<(), SendError> {
        self.sender.send_delayed(event, delay_ms)
    }

    /// Identity of the active state.
    pub fn active_id(&self) -> StateId {
        self.active
    }

    /// Time the active state has been resident.
    pub fn time_in_state(&self) -> Duration {
        Duration::from_micros(self.now_micros.saturating_sub(self.entered_micros))
    }

    /// Check whether the active state has been resident at least `timeout`.
    ///
    /// With `generate_event` set, an elapsed timeout also enqueues
    /// `Event { kind: TIMEOUT, arg: timeout-in-micros }`.
    pub fn timeout(&self, timeout: Duration, generate_event: bool) -> bool {
        let hit = self.time_in_state() >= timeout;
        if hit && generate_event {
            // Saturate where usize cannot hold the microsecond count.
            let arg = usize::try_from(timeout.as_micros()).unwrap_or(usize::MAX);
            if self.sender.send(Event::new(EventKind::TIMEOUT, arg)).is_err() {
                warn!("timeout event dropped, queue is full");
            }
        }
        hit
    }

    /// Restart the residency clock of the active state.
    pub fn reset_timeout(&mut self) {
        self.entered_micros = self.now_micros;
    }

    /// Request a cooperative engine stop.
    pub fn stop(&self) {
        self.sender.stop();
    }
}

/// Hierarchical state machine engine.
///
/// See the [crate docs](crate) for a full walkthrough. The expected life of
/// an engine: register states (directly or through
/// [`Engine::builder`](crate::EngineBuilder)), call [`begin_at`], then
/// either drive ticks yourself with [`update`] or hand the thread over to
/// [`run`] until some party calls [`stop`].
///
/// [`begin_at`]: Engine::begin_at
/// [`update`]: Engine::update
/// [`run`]: Engine::run
/// [`stop`]: Engine::stop
pub struct Engine {
    registry: StateRegistry,
    stack: StateStack,
    shared: Arc<SharedQueue>,
    hooks: EngineHooks,
    clock: Box<dyn Clock>,
    active: Option<usize>,
    last_tick_micros: u64,
    entered_micros: u64,
    wait_timeout: Duration,
    started: bool,
}

impl Engine {
    /// Create an engine with default capacities and the monotonic clock.
    pub fn new() -> Self {
        Self::with_config(
            DEFAULT_QUEUE_CAPACITY,
            DEFAULT_STACK_CAPACITY,
            Duration::ZERO,
            Box::new(MonotonicClock::new()),
            EngineHooks::default(),
        )
    }

    /// Start configuring an engine.
    pub fn builder() -> crate::builder::EngineBuilder {
        crate::builder::EngineBuilder::new()
    }

    pub(crate) fn with_config(
        queue_capacity: usize,
        stack_capacity: usize,
        wait_timeout: Duration,
        clock: Box<dyn Clock>,
        hooks: EngineHooks,
    ) -> Self {
        Self {
            registry: StateRegistry::new(),
            stack: StateStack::new(stack_capacity),
            shared: SharedQueue::new(queue_capacity),
            hooks,
            clock,
            active: None,
            last_tick_micros: 0,
            entered_micros: 0,
            wait_timeout,
            started: false,
        }
    }

    /// Register a state under the identity it reports.
    pub fn add_state(&mut self, unit: impl StateHandler + 'static) -> Result<(), EngineError> {
        self.register(Box::new(unit), StateId::NONE)
    }

    /// Register a state, supplying the identity for handlers that report
    /// the sentinel.
    pub fn add_state_with_id(
        &mut self,
        unit: impl StateHandler + 'static,
        id: StateId,
    ) -> Result<(), EngineError> {
        self.register(Box::new(unit), id)
    }

    /// Allocate a `Default` handler and register it under `id`.
    pub fn add_default<T: StateHandler + Default + 'static>(
        &mut self,
        id: StateId,
    ) -> Result<(), EngineError> {
        self.register(Box::new(T::default()), id)
    }

    pub(crate) fn register(
        &mut self,
        unit: Box<dyn StateHandler>,
        fallback: StateId,
    ) -> Result<(), EngineError> {
        let name = unit.name().to_string();
        let id = self.registry.add(unit, fallback)?;
        debug!(%id, state = %name, "state registered");
        Ok(())
    }

    /// Cloneable cross-thread submission handle.
    pub fn sender(&self) -> EventSender {
        EventSender::new(Arc::clone(&self.shared))
    }

    /// Submit an event for the next tick.
    pub fn send_event(&self, event: Event) -> Result<(), SendError> {
        self.shared.enqueue(event, 0)
    }

    /// Submit an event to be dispatched no earlier than `delay_ms` from now.
    pub fn send_delayed_event(&self, event: Event, delay_ms: u32) -> Result<(), SendError> {
        self.shared.enqueue(event, delay_ms)
    }

    /// Set how long an idle `update()` parks waiting for events.
    pub fn set_wait_timeout(&mut self, timeout: Duration) {
        self.wait_timeout = timeout;
    }

    /// Install the engine-level event hook.
    ///
    /// The hook resolves every due event before the active state is
    /// consulted; any outcome other than [`Response::Unhandled`] wins.
    pub fn set_event_hook(
        &mut self,
        hook: impl FnMut(StateId, &Event) -> Response + Send + 'static,
    ) {
        self.hooks.on_event = Some(Box::new(hook));
    }

    /// Identity of the active state, or the sentinel before any switch.
    pub fn active_id(&self) -> StateId {
        self.active
            .map(|index| self.registry.id_at(index))
            .unwrap_or(StateId::NONE)
    }

    /// Look up a registered state by identity.
    pub fn get(&self, id: StateId) -> Option<&dyn StateHandler> {
        self.registry.by_id(id)
    }

    /// Check whether a state is registered under `id`.
    pub fn contains(&self, id: StateId) -> bool {
        self.registry.index_of(id).is_some()
    }

    /// Name of the state registered under `id`.
    pub fn state_name(&self, id: StateId) -> Option<&str> {
        self.registry.by_id(id).map(|unit| unit.name())
    }

    /// Depth of the saved-state stack.
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Number of events currently queued.
    pub fn queued_events(&self) -> usize {
        self.shared.len()
    }

    /// Broadcast one-time initialization to every registered state in
    /// registration order, aborting on the first failure.
    ///
    /// Resets the tick clock and clears the stop flag. After a failure the
    /// engine is partially initialized and must not be updated.
    pub fn begin(&mut self) -> Result<(), EngineError> {
        if let Some(hook) = self.hooks.on_begin.as_mut() {
            hook().map_err(|source| EngineError::InitFailed {
                state: "engine".to_string(),
                source,
            })?;
        }
        for index in 0..self.registry.len() {
            if let Err(source) = self.registry.unit_mut(index).begin() {
                let state = self.registry.unit(index).name().to_string();
                error!(%state, "state initialization failed, aborting startup");
                return Err(EngineError::InitFailed { state, source });
            }
        }
        self.last_tick_micros = self.clock.now_micros();
        self.shared.clear_stop();
        self.started = true;
        info!("engine started");
        Ok(())
    }

    /// [`begin`](Engine::begin), then switch to `initial` with no
    /// triggering event.
    pub fn begin_at(&mut self, initial: StateId) -> Result<(), EngineError> {
        self.begin()?;
        self.switch_to(initial, None)
    }

    /// Tear the engine down: exit the active state, broadcast `end()` in
    /// registration order, run the teardown hook.
    ///
    /// No engine operation is valid afterwards short of a fresh `begin()`.
    pub fn end(&mut self) {
        if let Some(index) = self.active.take() {
            let mut ctx = self.context();
            self.registry.unit_mut(index).exit(&mut ctx, None);
        }
        for index in 0..self.registry.len() {
            self.registry.unit_mut(index).end();
        }
        if let Some(hook) = self.hooks.on_end.as_mut() {
            hook();
        }
        self.started = false;
        info!("engine terminated");
    }

    /// Run a single engine tick.
    ///
    /// Runs the tick hook, parks up to the configured wait timeout while
    /// the queue is idle, dispatches every due event in order, and calls
    /// `update` on the active state exactly once.
    pub fn update(&mut self) -> Result<(), EngineError> {
        if !self.started {
            return Err(EngineError::NotStarted);
        }
        if let Some(hook) = self.hooks.on_tick.as_mut() {
            hook();
        }

        self.shared.wait_ready(self.wait_timeout);

        let now = self.clock.now_micros();
        let elapsed = now.saturating_sub(self.last_tick_micros);
        self.last_tick_micros = now;

        for event in self.shared.collect_due(elapsed) {
            self.dispatch(&event);
        }

        if let Some(index) = self.active {
            let mut ctx = self.context();
            self.registry.unit_mut(index).update(&mut ctx);
            self.entered_micros = ctx.entered_micros;
        } else {
            error!("no active state; was begin_at() called?");
        }
        Ok(())
    }

    /// Run ticks until a stop is requested.
    ///
    /// Sets the idle wait timeout to `poll_interval` first; callers that
    /// need to interleave other work should call [`update`](Engine::update)
    /// directly instead.
    pub fn run(&mut self, poll_interval: Duration) -> Result<(), EngineError> {
        self.set_wait_timeout(poll_interval);
        while !self.shared.stop_requested() {
            self.update()?;
        }
        Ok(())
    }

    /// Request a cooperative stop, observed between `update` iterations.
    pub fn stop(&self) {
        self.shared.request_stop();
    }

    /// Time the active state has been resident.
    pub fn time_in_state(&self) -> Duration {
        Duration::from_micros(self.clock.now_micros().saturating_sub(self.entered_micros))
    }

    /// Check whether the active state has been resident at least `timeout`,
    /// optionally enqueueing a timeout event.
    pub fn timeout(&self, timeout: Duration, generate_event: bool) -> bool {
        let hit = self.time_in_state() >= timeout;
        if hit && generate_event {
            // Saturate where usize cannot hold the microsecond count.
            let arg = usize::try_from(timeout.as_micros()).unwrap_or(usize::MAX);
            if self.send_event(Event::new(EventKind::TIMEOUT, arg)).is_err() {
                warn!("timeout event dropped, queue is full");
            }
        }
        hit
    }

    /// Restart the residency clock of the active state.
    pub fn reset_timeout(&mut self) {
        self.entered_micros = self.clock.now_micros();
    }

    fn context(&self) -> Context {
        Context {
            sender: self.sender(),
            active: self.active_id(),
            now_micros: self.clock.now_micros(),
            entered_micros: self.entered_micros,
        }
    }

    /// Resolve one due event (engine hook first, then the active state)
    /// and apply the outcome.
    fn dispatch(&mut self, event: &Event) {
        trace!(kind = %event.kind, arg = event.arg, "processing event");
        let active = self.active_id();
        let mut outcome = match self.hooks.on_event.as_mut() {
            Some(hook) => hook(active, event),
            None => Response::Unhandled,
        };
        if outcome == Response::Unhandled {
            if let Some(index) = self.active {
                outcome = self.registry.unit(index).on_event(event);
            }
        }
        match outcome {
            Response::Unhandled => {
                warn!(kind = %event.kind, arg = event.arg, "event is not handled");
            }
            Response::Handled => {}
            Response::Switch(target) => {
                if let Err(reason) = self.switch_to(target, Some(event)) {
                    debug!(%target, %reason, "switch rejected");
                }
            }
            Response::Push(target) => {
                if let Err(reason) = self.push_to(target, Some(event)) {
                    debug!(%target, %reason, "push rejected");
                }
            }
            Response::Pop => {
                if let Err(reason) = self.pop(Some(event)) {
                    debug!(%reason, "pop rejected");
                }
            }
        }
    }

    /// Make `target` the active state: exit the old state, reassign, record
    /// the entry timestamp, enter the new state.
    ///
    /// The sentinel and the currently-active identity are no-op failures;
    /// exit/enter are never invoked for them.
    fn switch_to(&mut self, target: StateId, event: Option<&Event>) -> Result<(), EngineError> {
        if target.is_none() {
            return Err(EngineError::NoTarget);
        }
        if self.active_id() == target {
            return Err(EngineError::AlreadyActive(target));
        }
        let Some(index) = self.registry.index_of(target) else {
            error!(%target, "switch failed, state not found");
            return Err(EngineError::UnknownState(target));
        };

        if let Some(current) = self.active {
            let mut ctx = self.context();
            self.registry.unit_mut(current).exit(&mut ctx, event);
        }
        info!(state = %self.registry.unit(index).name(), %target, "switching state");
        self.active = Some(index);
        self.entered_micros = self.clock.now_micros();
        let mut ctx = self.context();
        self.registry.unit_mut(index).enter(&mut ctx, event);
        self.entered_micros = ctx.entered_micros;
        Ok(())
    }

    /// Save the active identity on the stack, then switch. A failed switch
    /// rolls the push back so the stack depth is unaffected. Fails before
    /// any state is active: the sentinel must never land on the stack,
    /// where it would make the entry unpoppable.
    fn push_to(&mut self, target: StateId, event: Option<&Event>) -> Result<(), EngineError> {
        let saved = self.active_id();
        if saved.is_none() {
            error!(%target, "cannot push with no active state");
            return Err(EngineError::NoTarget);
        }
        self.stack.push(saved).map_err(|err| {
            error!(%target, "failed to push state, stack is full");
            err
        })?;
        match self.switch_to(target, event) {
            Ok(()) => {
                debug!(%target, "push state successful");
                Ok(())
            }
            Err(err) => {
                self.stack.pop();
                error!(%target, "failed to push state");
                Err(err)
            }
        }
    }

    /// Return to the most recently pushed state. A failed switch restores
    /// the saved identity to the stack.
    fn pop(&mut self, event: Option<&Event>) -> Result<(), EngineError> {
        let Some(saved) = self.stack.pop() else {
            error!("failed to pop state: stack is empty");
            return Err(EngineError::EmptyStack);
        };
        match self.switch_to(saved, event) {
            Ok(()) => Ok(()),
            Err(err) => {
                // The slot was just vacated, this cannot overflow.
                let _ = self.stack.push(saved);
                Err(err)
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
