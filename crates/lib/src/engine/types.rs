//! Types shared by every execution engine.

use std::collections::BTreeMap;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::project::PartSpec;
use crate::step::{Features, Step};

/// Errors raised by an execution engine.
#[derive(Debug, Error)]
pub enum EngineError {
  /// The part definitions do not form a valid project.
  #[error("invalid parts: {0}")]
  InvalidParts(String),

  /// A requested part does not exist.
  #[error("a part named '{0}' is not defined in the parts list")]
  UnknownPart(String),

  /// A part script exited unsuccessfully.
  #[error("failed to run the {step} script for part '{part}' ({})", exit_description(.code))]
  ScriptFailed { part: String, step: Step, code: Option<i32> },

  /// A part tried to set a project variable it may not set.
  #[error("part '{part}': {message}")]
  ProjectVariable { part: String, message: String },

  /// A registered callback failed.
  #[error("callback '{name}' failed: {message}")]
  Callback { name: String, message: String },

  /// Filesystem or process failure.
  #[error("{context}: {source}")]
  Io {
    context: String,
    #[source]
    source: io::Error,
  },

  /// Anything the engine cannot classify.
  #[error("{0}")]
  Internal(String),
}

fn exit_description(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {}", code),
    None => "terminated by signal".to_string(),
  }
}

impl EngineError {
  pub fn io(context: impl Into<String>, source: io::Error) -> Self {
    Self::Io {
      context: context.into(),
      source,
    }
  }

  /// The part this error is about, if any.
  pub fn part_name(&self) -> Option<&str> {
    match self {
      EngineError::UnknownPart(part)
      | EngineError::ScriptFailed { part, .. }
      | EngineError::ProjectVariable { part, .. } => Some(part),
      _ => None,
    }
  }
}

/// Static configuration used to create an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
  pub application_name: String,
  pub project_name: String,
  pub parts: BTreeMap<String, PartSpec>,
  /// Target architecture, in platform naming.
  pub arch: String,
  /// Directory relative part sources are resolved against.
  pub project_dir: PathBuf,
  pub work_dir: PathBuf,
  pub cache_dir: PathBuf,
  pub ignore_local_sources: Vec<String>,
  pub parallel_build_count: NonZeroUsize,
  /// Part allowed to set project variables.
  pub project_vars_part_name: Option<String>,
  /// Declared project variables with their initial values (empty if unset).
  pub project_vars: BTreeMap<String, String>,
  pub features: Features,
}

/// Directory layout of an engine's work tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDirs {
  pub work_dir: PathBuf,
  pub parts_dir: PathBuf,
  pub overlay_dir: PathBuf,
  pub stage_dir: PathBuf,
  pub prime_dir: PathBuf,
  pub repositories_dir: PathBuf,
}

impl ProjectDirs {
  pub fn new(work_dir: &Path) -> Self {
    Self {
      work_dir: work_dir.to_path_buf(),
      parts_dir: work_dir.join("parts"),
      overlay_dir: work_dir.join("overlay"),
      stage_dir: work_dir.join("stage"),
      prime_dir: work_dir.join("prime"),
      repositories_dir: work_dir.join("repositories"),
    }
  }

  pub fn part_dir(&self, part: &str) -> PathBuf {
    self.parts_dir.join(part)
  }

  pub fn part_src_dir(&self, part: &str) -> PathBuf {
    self.part_dir(part).join("src")
  }

  pub fn part_build_dir(&self, part: &str) -> PathBuf {
    self.part_dir(part).join("build")
  }

  pub fn part_install_dir(&self, part: &str) -> PathBuf {
    self.part_dir(part).join("install")
  }

  pub fn part_state_dir(&self, part: &str) -> PathBuf {
    self.part_dir(part).join("state")
  }
}

/// Project-level facts an engine exposes to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
  pub application_name: String,
  pub project_name: String,
  pub arch: String,
  pub parallel_build_count: NonZeroUsize,
  pub cache_dir: PathBuf,
  pub dirs: ProjectDirs,
  pub project_vars_part_name: Option<String>,
  project_vars: BTreeMap<String, String>,
}

impl ProjectInfo {
  pub fn new(config: &EngineConfig) -> Self {
    Self {
      application_name: config.application_name.clone(),
      project_name: config.project_name.clone(),
      arch: config.arch.clone(),
      parallel_build_count: config.parallel_build_count,
      cache_dir: config.cache_dir.clone(),
      dirs: ProjectDirs::new(&config.work_dir),
      project_vars_part_name: config.project_vars_part_name.clone(),
      project_vars: config.project_vars.clone(),
    }
  }

  /// Current value of a declared project variable. Unset variables are `None`.
  pub fn get_project_var(&self, name: &str) -> Option<&str> {
    self.project_vars.get(name).map(String::as_str).filter(|v| !v.is_empty())
  }

  pub fn project_vars(&self) -> &BTreeMap<String, String> {
    &self.project_vars
  }

  /// Set a project variable on behalf of `part`.
  ///
  /// Only the adopting part may set variables, and only declared ones.
  pub fn set_project_var(&mut self, part: &str, name: &str, value: &str) -> Result<(), EngineError> {
    if self.project_vars_part_name.as_deref() != Some(part) {
      return Err(EngineError::ProjectVariable {
        part: part.to_string(),
        message: format!("'{}' can only be set in the part that adopts external metadata", name),
      });
    }
    let Some(slot) = self.project_vars.get_mut(name) else {
      return Err(EngineError::ProjectVariable {
        part: part.to_string(),
        message: format!("unknown project variable '{}'", name),
      });
    };
    *slot = value.to_string();
    Ok(())
  }

  /// Replace every declared variable's value, keeping the declared set.
  pub(crate) fn reset_project_vars(&mut self, values: &BTreeMap<String, String>) {
    for (name, slot) in self.project_vars.iter_mut() {
      *slot = values.get(name).cloned().unwrap_or_default();
    }
  }
}

/// What a post-step callback is told about the step that just finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepInfo {
  pub part_name: String,
  pub step: Step,
  pub arch: String,
  pub parallel_build_count: NonZeroUsize,
  pub work_dir: PathBuf,
  pub prime_dir: PathBuf,
}
