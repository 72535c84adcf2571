//! Callback registry owned by an execution engine.
//!
//! Two hook points exist:
//! - post-step hooks, run after a part finishes one of the steps they were
//!   registered for;
//! - configure-overlay hooks, run before the first overlay script so they can
//!   prepare the overlay filesystem. These are keyed by name and may only be
//!   registered once.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use super::types::{EngineError, ProjectInfo, StepInfo};
use crate::step::Step;

pub type PostStepHook = Box<dyn Fn(&StepInfo) -> bool>;
pub type OverlayHook = Box<dyn Fn(&Path, &ProjectInfo) -> Result<(), EngineError>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackError {
  #[error("callback '{0}' is already registered")]
  AlreadyRegistered(String),
}

#[derive(Default)]
pub struct Callbacks {
  post_step: Vec<(Vec<Step>, PostStepHook)>,
  configure_overlay: Vec<(String, OverlayHook)>,
}

impl std::fmt::Debug for Callbacks {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Callbacks")
      .field("post_step", &self.post_step.len())
      .field(
        "configure_overlay",
        &self.configure_overlay.iter().map(|(name, _)| name).collect::<Vec<_>>(),
      )
      .finish()
  }
}

impl Callbacks {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a hook to run after any of `steps` completes for a part.
  pub fn register_post_step(&mut self, steps: &[Step], hook: PostStepHook) {
    self.post_step.push((steps.to_vec(), hook));
  }

  /// Register a named overlay configuration hook.
  pub fn register_configure_overlay(&mut self, name: &str, hook: OverlayHook) -> Result<(), CallbackError> {
    if self.configure_overlay.iter().any(|(existing, _)| existing == name) {
      return Err(CallbackError::AlreadyRegistered(name.to_string()));
    }
    self.configure_overlay.push((name.to_string(), hook));
    Ok(())
  }

  pub fn has_configure_overlay(&self, name: &str) -> bool {
    self.configure_overlay.iter().any(|(existing, _)| existing == name)
  }

  /// Run the post-step hooks registered for `info.step`.
  ///
  /// Returns true if any hook reported a modification.
  pub fn run_post_step(&self, info: &StepInfo) -> bool {
    let mut modified = false;
    for (steps, hook) in &self.post_step {
      if steps.contains(&info.step) {
        debug!(part = %info.part_name, step = %info.step, "running post-step callback");
        modified |= hook(info);
      }
    }
    modified
  }

  /// Run every configure-overlay hook in registration order.
  pub fn run_configure_overlay(&self, overlay_dir: &Path, info: &ProjectInfo) -> Result<(), EngineError> {
    for (name, hook) in &self.configure_overlay {
      debug!(callback = %name, overlay = %overlay_dir.display(), "configuring overlay");
      hook(overlay_dir, info)?;
    }
    Ok(())
  }
}
