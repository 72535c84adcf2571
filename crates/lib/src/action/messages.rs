//! Human-readable progress messages for planned actions.

use super::{Action, ActionKind};
use crate::step::Step;

/// Message template for a step/kind pair, or `None` if the engine can never
/// emit that combination.
pub fn template(step: Step, kind: ActionKind) -> Option<&'static str> {
  use ActionKind::*;

  let message = match (step, kind) {
    (Step::Pull, Run) => "Pulling",
    (Step::Pull, Rerun) => "Repulling",
    (Step::Pull, Skip) => "Skipping pull for",
    (Step::Pull, Update) => "Updating sources for",

    (Step::Overlay, Run) => "Overlaying",
    (Step::Overlay, Rerun) => "Re-overlaying",
    (Step::Overlay, Skip) => "Skipping overlay for",
    (Step::Overlay, Update) => "Updating overlay for",
    (Step::Overlay, Reapply) => "Reapplying",

    (Step::Build, Run) => "Building",
    (Step::Build, Rerun) => "Rebuilding",
    (Step::Build, Skip) => "Skipping build for",
    (Step::Build, Update) => "Updating build for",

    (Step::Stage, Run) => "Staging",
    (Step::Stage, Rerun) => "Restaging",
    (Step::Stage, Skip) => "Skipping stage for",
    (Step::Stage, Update) => "Updating stage for",

    (Step::Prime, Run) => "Priming",
    (Step::Prime, Rerun) => "Repriming",
    (Step::Prime, Skip) => "Skipping prime for",
    (Step::Prime, Update) => "Updating prime for",

    (_, Reapply) => return None,
  };

  Some(message)
}

/// Render the progress message for an action.
///
/// # Panics
///
/// Panics if the action pairs a step with a kind no engine may emit (a
/// `Reapply` outside the overlay step). That is a planner bug.
pub fn render(action: &Action) -> String {
  let Some(template) = template(action.step, action.kind) else {
    panic!(
      "no progress message for {} action on {} step",
      action.kind, action.step
    );
  };

  let mut message = format!("{} {}", template, action.part_name);
  if let Some(reason) = action.reason.as_deref().filter(|r| !r.is_empty()) {
    message.push_str(&format!(" ({})", reason));
  }
  message
}
