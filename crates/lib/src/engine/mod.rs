//! Execution engine interface.
//!
//! The engine decides which parts are outdated, plans the actions that bring
//! them up to a target step, and performs the work of each action in its
//! sandbox. The lifecycle drives an engine only through [`ExecutionEngine`];
//! [`local::LocalEngine`] is the engine shipped with this crate.

pub mod callbacks;
pub mod local;
mod types;

use std::io::Write;

pub use callbacks::{CallbackError, Callbacks, OverlayHook, PostStepHook};
pub use types::*;

use crate::action::Action;
use crate::project::PackageRepository;
use crate::step::Step;

/// Plans and performs the per-part step work for a lifecycle.
pub trait ExecutionEngine {
  /// Project-level facts, including the work tree layout and project variables.
  fn project_info(&self) -> &ProjectInfo;

  /// Plan the actions needed to bring `part_names` (all parts if `None`) to `target`.
  fn plan(&self, target: Step, part_names: Option<&[String]>) -> Result<Vec<Action>, EngineError>;

  /// Execute one planned action, writing interleaved stdout/stderr of its work to `output`.
  fn execute(&mut self, action: &Action, output: &mut dyn Write) -> Result<(), EngineError>;

  /// Remove the artifacts of `part_names`, or of every part if `None`.
  fn clean(&mut self, part_names: Option<&[String]>) -> Result<(), EngineError>;

  /// Make auxiliary package repositories available on the base filesystem.
  fn install_repositories(&mut self, repositories: &[PackageRepository]) -> Result<(), EngineError>;

  fn callbacks_mut(&mut self) -> &mut Callbacks;
}

/// Creates an engine from static configuration.
pub trait EngineFactory {
  type Engine: ExecutionEngine;

  fn create(&self, config: EngineConfig) -> Result<Self::Engine, EngineError>;
}

impl<F, E> EngineFactory for F
where
  F: Fn(EngineConfig) -> Result<E, EngineError>,
  E: ExecutionEngine,
{
  type Engine = E;

  fn create(&self, config: EngineConfig) -> Result<E, EngineError> {
    self(config)
  }
}
