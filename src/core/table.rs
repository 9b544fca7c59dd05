//! Declarative transition tables.
//!
//! A [`TransitionTable`] is a pure function from (active identity, event) to
//! a [`Response`], implemented as an ordered list of guarded [`Rule`]s.
//! A rule matches when the event kind equals the rule's kind and the rule's
//! expected argument is either the wildcard or equal to the event's
//! argument. Rules may be scoped to a source state (they only apply while
//! that state is active) or unscoped; unscoped rules are evaluated first,
//! and within each group the first matching rule in declaration order wins.

use crate::core::event::{Event, EventKind};
use crate::core::state::{Response, StateId};
use serde::{Deserialize, Serialize};

/// One guarded transition rule.
///
/// `None` in `arg` is the argument wildcard; `None` in `source` declares the
/// rule unscoped.
///
/// # Example
///
/// ```rust
/// use statecraft::{Event, EventKind, Response, Rule, StateId};
///
/// const ARMED: StateId = StateId(1);
/// const FIRING: StateId = StateId(2);
/// const TRIGGER: EventKind = EventKind(1);
///
/// // Only fires while ARMED is active and the argument is exactly 1.
/// let rule = Rule::on(TRIGGER).arg(1).from(ARMED).switch_to(FIRING);
///
/// assert!(rule.matches(ARMED, &Event::new(TRIGGER, 1)));
/// assert!(!rule.matches(ARMED, &Event::new(TRIGGER, 2)));
/// assert!(!rule.matches(FIRING, &Event::new(TRIGGER, 1)));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Rule {
    /// Event kind this rule reacts to.
    pub kind: EventKind,
    /// Expected argument; `None` matches any argument.
    pub arg: Option<usize>,
    /// Source-state scope; `None` applies regardless of the active state.
    pub source: Option<StateId>,
    /// Outcome applied when the rule matches.
    pub outcome: Response,
}

impl Rule {
    /// Start a rule reacting to `kind`, with wildcard argument, unscoped,
    /// consuming the event without a transition.
    pub fn on(kind: EventKind) -> Self {
        Self {
            kind,
            arg: None,
            source: None,
            outcome: Response::Handled,
        }
    }

    /// Require an exact event argument instead of the wildcard.
    pub fn arg(mut self, arg: usize) -> Self {
        self.arg = Some(arg);
        self
    }

    /// Scope the rule to a source state.
    pub fn from(mut self, source: StateId) -> Self {
        self.source = Some(source);
        self
    }

    /// Make the rule switch to `target`.
    pub fn switch_to(mut self, target: StateId) -> Self {
        self.outcome = Response::Switch(target);
        self
    }

    /// Make the rule push the active state and switch to `target`.
    pub fn push_to(mut self, target: StateId) -> Self {
        self.outcome = Response::Push(target);
        self
    }

    /// Make the rule pop back to the most recently pushed state.
    pub fn pop(mut self) -> Self {
        self.outcome = Response::Pop;
        self
    }

    /// Check whether this rule applies to `event` while `active` is the
    /// active state.
    pub fn matches(&self, active: StateId, event: &Event) -> bool {
        self.source.map_or(true, |source| source == active)
            && self.kind == event.kind
            && self.arg.map_or(true, |arg| arg == event.arg)
    }

    fn matches_event(&self, event: &Event) -> bool {
        self.kind == event.kind && self.arg.map_or(true, |arg| arg == event.arg)
    }
}

/// Ordered collection of rules with first-match-wins resolution.
///
/// # Example
///
/// ```rust
/// use statecraft::{Event, EventKind, Response, Rule, StateId, TransitionTable};
///
/// const S1: StateId = StateId(1);
/// const S2: StateId = StateId(2);
/// const GO: EventKind = EventKind(1);
/// const ABORT: EventKind = EventKind(2);
///
/// let table = TransitionTable::new()
///     .rule(Rule::on(ABORT).pop())
///     .rule(Rule::on(GO).from(S1).switch_to(S2));
///
/// assert_eq!(table.resolve(S1, &Event::signal(GO)), Response::Switch(S2));
/// assert_eq!(table.resolve(S2, &Event::signal(GO)), Response::Unhandled);
/// assert_eq!(table.resolve(S2, &Event::signal(ABORT)), Response::Pop);
/// ```
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
pub struct TransitionTable {
    rules: Vec<Rule>,
}

impl TransitionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from pre-constructed rules.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// Append a rule, keeping declaration order.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Number of rules in the table.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check whether the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolve `event` against the table while `active` is the active state.
    ///
    /// Unscoped rules are consulted first, then rules scoped to `active`;
    /// the first match in declaration order wins within each group.
    pub fn resolve(&self, active: StateId, event: &Event) -> Response {
        let unscoped = self
            .rules
            .iter()
            .filter(|rule| rule.source.is_none())
            .find(|rule| rule.matches_event(event));
        let scoped = || {
            self.rules
                .iter()
                .filter(|rule| rule.source == Some(active))
                .find(|rule| rule.matches_event(event))
        };
        unscoped
            .or_else(scoped)
            .map_or(Response::Unhandled, |rule| rule.outcome)
    }
}
