//! Incremental, state-machine based syntax highlighting.
//!
//! [`machine`] defines the loaded syntax itself (a set of [`machine::State`]s
//! with ordered [`machine::Condition`]s) and the per-line highlight pass.
//! [`cache`] memoizes the start state of every line so that re-highlighting
//! after an edit only has to redo the lines actually affected, repairing
//! "holes" left by edits one at a time as they're queried.

mod cache;
mod machine;

pub use cache::{Highlighter, LineColorCache, LineSource};
pub use machine::{Action, ByteSet, Condition, HLStateMachine, State, StateId};

pub type ColorRef = u16;
