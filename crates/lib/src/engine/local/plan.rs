//! Action planning for the local engine.
//!
//! Plans are step-major: every selected part finishes a step before any part
//! starts the next one. Building a part requires its `after` dependencies to
//! be staged, so those are pulled into the plan as needed.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use tracing::debug;

use super::dag::PartGraph;
use super::fs::{IgnoreRules, newest_mtime};
use super::state::StateStore;
use crate::action::{Action, ActionKind};
use crate::engine::EngineError;
use crate::step::{Features, Step};

pub struct Planner<'a> {
  pub graph: &'a PartGraph,
  pub store: &'a StateStore,
  pub features: Features,
  /// Current definition hash per part.
  pub hashes: &'a BTreeMap<String, String>,
  /// Resolved local source directory per part.
  pub sources: &'a BTreeMap<String, PathBuf>,
  pub ignore: &'a IgnoreRules,
}

#[derive(Default)]
struct PlanState {
  decided: HashMap<(String, Step), ActionKind>,
  actions: Vec<Action>,
}

impl Planner<'_> {
  pub fn plan(&self, target: Step, part_names: Option<&[String]>) -> Result<Vec<Action>, EngineError> {
    let selected: Vec<String> = match part_names {
      Some(names) if !names.is_empty() => {
        for name in names {
          if !self.graph.contains(name) {
            return Err(EngineError::UnknownPart(name.clone()));
          }
        }
        self
          .graph
          .topological_order()
          .iter()
          .filter(|part| names.contains(part))
          .cloned()
          .collect()
      }
      _ => self.graph.topological_order().to_vec(),
    };

    let mut state = PlanState::default();
    for step in target.steps_through(&self.features) {
      for part in &selected {
        self.ensure(&mut state, part, step, None)?;
      }
    }

    debug!(target = %target, actions = state.actions.len(), "planned actions");
    Ok(state.actions)
  }

  fn ensure(&self, state: &mut PlanState, part: &str, step: Step, required_by: Option<&str>) -> Result<(), EngineError> {
    if state.decided.contains_key(&(part.to_string(), step)) {
      return Ok(());
    }

    if step == Step::Build {
      for dep in self.graph.dependencies(part) {
        for dep_step in Step::Stage.steps_through(&self.features) {
          self.ensure(state, &dep, dep_step, Some(part))?;
        }
      }
    }

    let (kind, reason) = self.decide(state, part, step)?;
    let reason = match (kind, required_by) {
      (ActionKind::Skip, _) | (_, None) => reason,
      (_, Some(dependent)) => Some(format!("required to build '{}'", dependent)),
    };

    let mut action = Action::new(part, step, kind);
    if let Some(reason) = reason {
      action = action.with_reason(reason);
    }
    debug!(part = %part, step = %step, kind = %kind, "planned action");
    state.decided.insert((part.to_string(), step), kind);
    state.actions.push(action);
    Ok(())
  }

  fn decide(&self, state: &PlanState, part: &str, step: Step) -> Result<(ActionKind, Option<String>), EngineError> {
    let Some(current) = self.store.load(part, step)? else {
      return Ok((ActionKind::Run, None));
    };

    if self.hashes.get(part) != Some(&current.part_hash) {
      return Ok((ActionKind::Rerun, Some("part properties changed".to_string())));
    }

    if let Some(prev) = step.previous_enabled(&self.features) {
      let prev_kind = state.decided.get(&(part.to_string(), prev)).copied();
      let prev_newer = self
        .store
        .load(part, prev)?
        .is_none_or(|prev_state| prev_state.completed_at > current.completed_at);
      if is_change(prev_kind) || prev_newer {
        let kind = if step == Step::Build && prev_kind == Some(ActionKind::Update) {
          ActionKind::Update
        } else {
          ActionKind::Rerun
        };
        return Ok((kind, Some(format!("'{}' step changed", prev))));
      }
    }

    match step {
      Step::Pull => {
        if let Some(source) = self.sources.get(part)
          && newest_mtime(source, self.ignore).is_some_and(|mtime| mtime > current.completed_at)
        {
          return Ok((ActionKind::Update, Some("source changed".to_string())));
        }
      }
      Step::Overlay => {
        let lower_changed = self
          .graph
          .topological_order()
          .iter()
          .take_while(|name| name.as_str() != part)
          .any(|name| is_change(state.decided.get(&(name.clone(), Step::Overlay)).copied()));
        if lower_changed {
          return Ok((ActionKind::Reapply, Some("previous layer changed".to_string())));
        }
      }
      Step::Build => {
        for dep in self.graph.dependencies(part) {
          let staged_now = is_change(state.decided.get(&(dep.clone(), Step::Stage)).copied());
          let staged_later = self
            .store
            .load(&dep, Step::Stage)?
            .is_some_and(|dep_state| dep_state.completed_at > current.completed_at);
          if staged_now || staged_later {
            return Ok((ActionKind::Rerun, Some(format!("stage for part '{}' changed", dep))));
          }
        }
      }
      Step::Stage | Step::Prime => {}
    }

    Ok((ActionKind::Skip, Some("already ran".to_string())))
  }
}

fn is_change(kind: Option<ActionKind>) -> bool {
  matches!(
    kind,
    Some(ActionKind::Run | ActionKind::Rerun | ActionKind::Update | ActionKind::Reapply)
  )
}
