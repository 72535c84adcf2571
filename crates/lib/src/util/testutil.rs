//! Test doubles for the lifecycle: a scripted execution engine and an emitter
//! that records everything it is given.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::action::Action;
use crate::engine::{Callbacks, EngineConfig, EngineError, ExecutionEngine, ProjectInfo, StepInfo};
use crate::lifecycle::Emitter;
use crate::project::{PackageRepository, Project};
use crate::step::{Features, Step};

/// A project with a single empty part named `main`.
pub fn project() -> Project {
  serde_yaml::from_str("name: demo\nparts:\n  main: {}\n").unwrap()
}

pub fn engine_config() -> EngineConfig {
  EngineConfig {
    application_name: "testcraft".to_string(),
    project_name: "demo".to_string(),
    parts: project().parts,
    arch: "x86_64".to_string(),
    project_dir: PathBuf::from("/project"),
    work_dir: PathBuf::from("/work"),
    cache_dir: PathBuf::from("/cache"),
    ignore_local_sources: Vec::new(),
    parallel_build_count: NonZeroUsize::MIN,
    project_vars_part_name: Some("main".to_string()),
    project_vars: BTreeMap::from([("version".to_string(), String::new())]),
    features: Features::default(),
  }
}

/// What a [`FakeEngine`] does when driven.
#[derive(Debug, Clone, Default)]
pub struct FakeScript {
  /// Returned from every `plan` call.
  pub plan: Vec<Action>,
  /// Executing this part/step fails.
  pub fail_on: Option<(String, Step)>,
  /// `(part, variable, value)` set when the part executes a step.
  pub assignments: Vec<(String, String, String)>,
  /// Variables already set when the engine is created.
  pub preset: Vec<(String, String)>,
  /// Reject the configuration with this message.
  pub reject: Option<String>,
}

pub struct FakeEngine {
  pub config: EngineConfig,
  pub info: ProjectInfo,
  pub callbacks: Callbacks,
  pub script: FakeScript,
  pub executed: Vec<Action>,
  pub cleaned: Vec<Option<Vec<String>>>,
  pub installed: Vec<Vec<PackageRepository>>,
  pub post_step_results: Vec<(Step, bool)>,
  planned: RefCell<Vec<(Step, Option<Vec<String>>)>>,
}

impl FakeEngine {
  pub fn new(config: EngineConfig) -> Self {
    Self {
      info: ProjectInfo::new(&config),
      config,
      callbacks: Callbacks::new(),
      script: FakeScript::default(),
      executed: Vec::new(),
      cleaned: Vec::new(),
      installed: Vec::new(),
      post_step_results: Vec::new(),
      planned: RefCell::new(Vec::new()),
    }
  }

  /// Every `(target, part_names)` the engine was asked to plan.
  pub fn planned(&self) -> Vec<(Step, Option<Vec<String>>)> {
    self.planned.borrow().clone()
  }
}

impl Default for FakeEngine {
  fn default() -> Self {
    Self::new(engine_config())
  }
}

/// Engine factory producing [`FakeEngine`]s that follow `script`.
pub fn fake_factory(script: FakeScript) -> impl Fn(EngineConfig) -> Result<FakeEngine, EngineError> {
  move |config| {
    if let Some(message) = &script.reject {
      return Err(EngineError::InvalidParts(message.clone()));
    }
    let mut engine = FakeEngine::new(config);
    let adopting = engine.info.project_vars_part_name.clone().unwrap_or_default();
    for (name, value) in &script.preset {
      engine.info.set_project_var(&adopting, name, value)?;
    }
    engine.script = script.clone();
    Ok(engine)
  }
}

impl ExecutionEngine for FakeEngine {
  fn project_info(&self) -> &ProjectInfo {
    &self.info
  }

  fn plan(&self, target: Step, part_names: Option<&[String]>) -> Result<Vec<Action>, EngineError> {
    self.planned.borrow_mut().push((target, part_names.map(<[String]>::to_vec)));
    Ok(self.script.plan.clone())
  }

  fn execute(&mut self, action: &Action, output: &mut dyn Write) -> Result<(), EngineError> {
    self.executed.push(action.clone());
    if self.script.fail_on == Some((action.part_name.clone(), action.step)) {
      return Err(EngineError::ScriptFailed {
        part: action.part_name.clone(),
        step: action.step,
        code: Some(1),
      });
    }

    writeln!(output, "{} {}", action.step, action.part_name).map_err(|e| EngineError::io("write failed", e))?;
    for (part, name, value) in self.script.assignments.clone() {
      if part == action.part_name {
        self.info.set_project_var(&part, &name, &value)?;
      }
    }

    let info = StepInfo {
      part_name: action.part_name.clone(),
      step: action.step,
      arch: self.info.arch.clone(),
      parallel_build_count: self.info.parallel_build_count,
      work_dir: self.info.dirs.work_dir.clone(),
      prime_dir: self.info.dirs.prime_dir.clone(),
    };
    let modified = self.callbacks.run_post_step(&info);
    self.post_step_results.push((action.step, modified));
    Ok(())
  }

  fn clean(&mut self, part_names: Option<&[String]>) -> Result<(), EngineError> {
    self.cleaned.push(part_names.map(<[String]>::to_vec));
    Ok(())
  }

  fn install_repositories(&mut self, repositories: &[PackageRepository]) -> Result<(), EngineError> {
    self.installed.push(repositories.to_vec());
    Ok(())
  }

  fn callbacks_mut(&mut self) -> &mut Callbacks {
    &mut self.callbacks
  }
}

/// Records progress messages and stream contents.
#[derive(Debug, Default)]
pub struct RecordingEmitter {
  pub progress: Vec<String>,
  pub streams: Vec<(String, Vec<u8>)>,
}

impl Emitter for RecordingEmitter {
  fn progress(&mut self, message: &str) {
    self.progress.push(message.to_string());
  }

  fn open_stream(&mut self, message: &str) -> Box<dyn Write + '_> {
    self.streams.push((message.to_string(), Vec::new()));
    let (_, buffer) = self.streams.last_mut().unwrap();
    Box::new(buffer)
  }
}
