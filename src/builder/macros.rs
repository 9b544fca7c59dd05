//! Macros for declarative transition tables.

/// Build a [`TransitionTable`](crate::TransitionTable) from rule lines.
///
/// Each line reads `kind, argument, source => outcome`. Use `_` for the
/// argument wildcard and for an unscoped source.
///
/// # Example
///
/// ```rust
/// use statecraft::{transition_table, Event, EventKind, Response, StateId};
///
/// const S1: StateId = StateId(1);
/// const S2: StateId = StateId(2);
/// const S3: StateId = StateId(3);
/// const EVENT_1: EventKind = EventKind(1);
/// const EVENT_2: EventKind = EventKind(2);
/// const EVENT_3: EventKind = EventKind(3);
///
/// let table = transition_table! {
///     EVENT_1, 1, S1 => Response::Switch(S2);
///     EVENT_3, _, _  => Response::Push(S3);
///     EVENT_2, 2, S3 => Response::Pop;
/// };
///
/// assert_eq!(table.resolve(S1, &Event::new(EVENT_1, 1)), Response::Switch(S2));
/// assert_eq!(table.resolve(S2, &Event::new(EVENT_3, 9)), Response::Push(S3));
/// assert_eq!(table.resolve(S1, &Event::new(EVENT_2, 2)), Response::Unhandled);
/// ```
#[macro_export]
macro_rules! transition_table {
    (@opt _) => { None };
    (@opt $value:expr) => { Some($value) };
    ( $( $kind:expr , $arg:tt , $source:tt => $outcome:expr );* $(;)? ) => {
        $crate::TransitionTable::from_rules([
            $(
                $crate::Rule {
                    kind: $kind,
                    arg: $crate::transition_table!(@opt $arg),
                    source: $crate::transition_table!(@opt $source),
                    outcome: $outcome,
                }
            ),*
        ])
    };
}
