//! Closure-backed states.
//!
//! [`StateBuilder`] assembles a [`StateHandler`] from a plain record of
//! optional callbacks — `on_enter`, `on_update`, `on_exit`, each defaulting
//! to a no-op, plus a resolver (a closure or a [`TransitionTable`]). This
//! covers the common case where a state is a bundle of free functions and a
//! rule table rather than a dedicated type.

use crate::builder::error::BuildError;
use crate::core::{Event, Response, StateHandler, StateId, TransitionTable};
use crate::engine::Context;

type LifecycleFn = Box<dyn FnMut(&mut Context, Option<&Event>) + Send>;
type UpdateFn = Box<dyn FnMut(&mut Context) + Send>;
type ResolveFn = Box<dyn Fn(&Event) -> Response + Send>;

enum Resolver {
    None,
    Closure(ResolveFn),
    Table(TransitionTable),
}

/// A state assembled from closures by [`StateBuilder`].
pub struct ClosureState {
    id: StateId,
    name: String,
    enter: Option<LifecycleFn>,
    update: Option<UpdateFn>,
    exit: Option<LifecycleFn>,
    resolver: Resolver,
}

impl StateHandler for ClosureState {
    fn id(&self) -> StateId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn enter(&mut self, ctx: &mut Context, event: Option<&Event>) {
        if let Some(callback) = self.enter.as_mut() {
            callback(ctx, event);
        }
    }

    fn update(&mut self, ctx: &mut Context) {
        if let Some(callback) = self.update.as_mut() {
            callback(ctx);
        }
    }

    fn exit(&mut self, ctx: &mut Context, event: Option<&Event>) {
        if let Some(callback) = self.exit.as_mut() {
            callback(ctx, event);
        }
    }

    fn on_event(&self, event: &Event) -> Response {
        match &self.resolver {
            Resolver::None => Response::Unhandled,
            Resolver::Closure(resolve) => resolve(event),
            Resolver::Table(table) => table.resolve(self.id, event),
        }
    }
}

/// Builder for closure-backed states.
///
/// # Example
///
/// ```rust
/// use statecraft::{EventKind, Response, Rule, StateBuilder, StateId, TransitionTable};
///
/// const HEATING: StateId = StateId(1);
/// const COOLING: StateId = StateId(2);
/// const TOO_HOT: EventKind = EventKind(1);
///
/// let heating = StateBuilder::new(HEATING, "heating")
///     .on_enter(|_ctx, _event| println!("heater on"))
///     .on_exit(|_ctx, _event| println!("heater off"))
///     .table(TransitionTable::new().rule(Rule::on(TOO_HOT).switch_to(COOLING)))
///     .build()
///     .unwrap();
/// ```
pub struct StateBuilder {
    id: StateId,
    name: String,
    enter: Option<LifecycleFn>,
    update: Option<UpdateFn>,
    exit: Option<LifecycleFn>,
    resolver: Resolver,
}

impl StateBuilder {
    /// Start building a state registered under `id`.
    ///
    /// Pass [`StateId::NONE`] to accept the id supplied at registration;
    /// states resolving through a table scoped to their own id must be
    /// given the id here.
    pub fn new(id: StateId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            enter: None,
            update: None,
            exit: None,
            resolver: Resolver::None,
        }
    }

    /// Callback invoked when the state becomes active (optional).
    pub fn on_enter(
        mut self,
        callback: impl FnMut(&mut Context, Option<&Event>) + Send + 'static,
    ) -> Self {
        self.enter = Some(Box::new(callback));
        self
    }

    /// Callback invoked once per tick while active (optional).
    pub fn on_update(mut self, callback: impl FnMut(&mut Context) + Send + 'static) -> Self {
        self.update = Some(Box::new(callback));
        self
    }

    /// Callback invoked when the state stops being active (optional).
    pub fn on_exit(
        mut self,
        callback: impl FnMut(&mut Context, Option<&Event>) + Send + 'static,
    ) -> Self {
        self.exit = Some(Box::new(callback));
        self
    }

    /// Resolve events with a pure closure (optional; replaces any table).
    pub fn on_event(mut self, resolve: impl Fn(&Event) -> Response + Send + 'static) -> Self {
        self.resolver = Resolver::Closure(Box::new(resolve));
        self
    }

    /// Resolve events against a transition table (optional; replaces any
    /// closure resolver).
    pub fn table(mut self, table: TransitionTable) -> Self {
        self.resolver = Resolver::Table(table);
        self
    }

    /// Build the state.
    pub fn build(self) -> Result<ClosureState, BuildError> {
        if self.name.is_empty() {
            return Err(BuildError::MissingStateName);
        }
        Ok(ClosureState {
            id: self.id,
            name: self.name,
            enter: self.enter,
            update: self.update,
            exit: self.exit,
            resolver: self.resolver,
        })
    }
}
