//! Lifecycle steps.
//!
//! Every part advances through the same fixed sequence of steps:
//!
//! ```text
//! pull -> overlay -> build -> stage -> prime
//! ```
//!
//! The overlay step only exists when the overlay feature is enabled. Name
//! resolution takes the feature set explicitly so it stays a pure function.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lifecycle::LifecycleError;

/// A lifecycle step. The derived ordering is the execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
  Pull,
  Overlay,
  Build,
  Stage,
  Prime,
}

/// Optional lifecycle capabilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
  pub enable_overlay: bool,
}

impl Step {
  /// All steps in execution order.
  pub const ALL: [Step; 5] = [Step::Pull, Step::Overlay, Step::Build, Step::Stage, Step::Prime];

  /// The terminal step of the lifecycle.
  pub const TERMINAL: Step = Step::Prime;

  pub fn as_str(&self) -> &'static str {
    match self {
      Step::Pull => "pull",
      Step::Overlay => "overlay",
      Step::Build => "build",
      Step::Stage => "stage",
      Step::Prime => "prime",
    }
  }

  /// Steps that must complete before this one, in execution order.
  pub fn previous_steps(&self) -> &'static [Step] {
    match self {
      Step::Pull => &[],
      Step::Overlay => &[Step::Pull],
      Step::Build => &[Step::Pull, Step::Overlay],
      Step::Stage => &[Step::Pull, Step::Overlay, Step::Build],
      Step::Prime => &[Step::Pull, Step::Overlay, Step::Build, Step::Stage],
    }
  }

  /// The step that runs right after this one, if any.
  pub fn next_step(&self) -> Option<Step> {
    match self {
      Step::Pull => Some(Step::Overlay),
      Step::Overlay => Some(Step::Build),
      Step::Build => Some(Step::Stage),
      Step::Stage => Some(Step::Prime),
      Step::Prime => None,
    }
  }

  /// Whether this step takes part in a lifecycle with the given features.
  pub fn is_enabled(&self, features: &Features) -> bool {
    *self != Step::Overlay || features.enable_overlay
  }

  /// The closest earlier step that is enabled under `features`.
  pub fn previous_enabled(&self, features: &Features) -> Option<Step> {
    self
      .previous_steps()
      .iter()
      .rev()
      .copied()
      .find(|prev| prev.is_enabled(features))
  }

  /// Steps up to and including `self` that are enabled under `features`.
  pub fn steps_through(&self, features: &Features) -> Vec<Step> {
    Step::ALL
      .iter()
      .copied()
      .filter(|step| step <= self && step.is_enabled(features))
      .collect()
  }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Resolve a step from its textual name.
///
/// Matching is case-insensitive. Naming the overlay step while the overlay
/// feature is disabled is an error, exactly like naming an unknown step.
pub fn resolve(name: &str, features: &Features) -> Result<Step, LifecycleError> {
  let step = Step::ALL
    .iter()
    .copied()
    .find(|step| step.as_str().eq_ignore_ascii_case(name))
    .ok_or_else(|| LifecycleError::InvalidStep(name.to_string()))?;

  if !step.is_enabled(features) {
    return Err(LifecycleError::InvalidStep(name.to_string()));
  }

  Ok(step)
}

/// The step immediately before the named one, skipping disabled steps.
///
/// Returns `None` for the first step.
pub fn previous_step(name: &str, features: &Features) -> Result<Option<Step>, LifecycleError> {
  Ok(resolve(name, features)?.previous_enabled(features))
}
