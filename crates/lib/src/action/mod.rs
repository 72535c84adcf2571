//! Planned lifecycle actions.
//!
//! An [`Action`] pairs a part with a [`Step`](crate::step::Step) and an
//! [`ActionKind`] explaining why the step is (re)processed or skipped. Plans
//! are ordered lists of actions produced by an execution engine.

pub mod messages;
mod types;

pub use messages::render;
pub use types::*;
