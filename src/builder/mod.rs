//! Builder API for ergonomic engine and state construction.
//!
//! This module provides fluent builders and macros for wiring engines with
//! minimal boilerplate: [`EngineBuilder`] for the engine itself,
//! [`StateBuilder`] for states assembled from closures and transition
//! tables, and the [`transition_table!`](crate::transition_table) macro for
//! declarative rule lists.

pub mod error;
pub mod machine;
pub mod macros;
pub mod state;

pub use error::BuildError;
pub use machine::EngineBuilder;
pub use state::{ClosureState, StateBuilder};
