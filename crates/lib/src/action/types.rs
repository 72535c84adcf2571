use std::fmt;

use serde::{Deserialize, Serialize};

use crate::step::Step;

/// Why a part/step pairing appears in a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
  /// The step has never run for this part.
  Run,
  /// The step ran before but is outdated and must run again from scratch.
  Rerun,
  /// The step is up to date.
  Skip,
  /// The step ran before and can be updated incrementally.
  Update,
  /// The overlay layer must be re-applied on top of a changed stack.
  Reapply,
}

impl ActionKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ActionKind::Run => "run",
      ActionKind::Rerun => "rerun",
      ActionKind::Skip => "skip",
      ActionKind::Update => "update",
      ActionKind::Reapply => "reapply",
    }
  }
}

impl fmt::Display for ActionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// A single planned unit of work: one part advancing through one step.
///
/// Actions are produced by the execution engine's planner and are never
/// modified afterwards; the lifecycle only renders and executes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
  pub part_name: String,
  pub step: Step,
  pub kind: ActionKind,
  pub reason: Option<String>,
}

impl Action {
  pub fn new(part_name: impl Into<String>, step: Step, kind: ActionKind) -> Self {
    Self {
      part_name: part_name.into(),
      step,
      kind,
      reason: None,
    }
  }

  pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
    self.reason = Some(reason.into());
    self
  }
}
