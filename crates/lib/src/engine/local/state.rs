//! Persistent per-part step state.
//!
//! Each completed step leaves a JSON file at
//! `parts/<part>/state/<step>.json`. The planner compares the recorded part
//! hash and completion time against the current definition and neighbouring
//! steps to decide whether the step is outdated.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::PART_HASH_PREFIX_LEN;
use crate::engine::{EngineError, ProjectDirs};
use crate::project::PartSpec;
use crate::step::Step;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepState {
  /// Hash of the part definition the step ran with.
  pub part_hash: String,
  /// Completion time, milliseconds since the Unix epoch.
  pub completed_at: u64,
  /// Files this step placed in a shared directory (stage or prime), relative to it.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub files: Vec<PathBuf>,
  /// Project variables set while running this step.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub project_vars: BTreeMap<String, String>,
}

impl StepState {
  pub fn new(part_hash: String) -> Self {
    Self {
      part_hash,
      completed_at: now_millis(),
      files: Vec::new(),
      project_vars: BTreeMap::new(),
    }
  }
}

pub fn now_millis() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_millis() as u64)
    .unwrap_or_default()
}

/// Truncated SHA-256 of the JSON-serialized part definition.
pub fn part_hash(spec: &PartSpec) -> Result<String, EngineError> {
  let serialized =
    serde_json::to_string(spec).map_err(|e| EngineError::Internal(format!("failed to hash part: {}", e)))?;
  let mut hasher = Sha256::new();
  hasher.update(serialized.as_bytes());
  let full = hex::encode(hasher.finalize());
  Ok(full[..PART_HASH_PREFIX_LEN].to_string())
}

/// Reads and writes step state files under a project's parts directory.
#[derive(Debug, Clone)]
pub struct StateStore {
  dirs: ProjectDirs,
}

impl StateStore {
  pub fn new(dirs: ProjectDirs) -> Self {
    Self { dirs }
  }

  fn state_path(&self, part: &str, step: Step) -> PathBuf {
    self.dirs.part_state_dir(part).join(format!("{}.json", step))
  }

  pub fn load(&self, part: &str, step: Step) -> Result<Option<StepState>, EngineError> {
    let path = self.state_path(part, step);
    if !path.exists() {
      return Ok(None);
    }
    let content = fs::read_to_string(&path)
      .map_err(|e| EngineError::io(format!("failed to read state file {}", path.display()), e))?;
    let state = serde_json::from_str(&content)
      .map_err(|e| EngineError::Internal(format!("corrupt state file {}: {}", path.display(), e)))?;
    Ok(Some(state))
  }

  pub fn save(&self, part: &str, step: Step, state: &StepState) -> Result<(), EngineError> {
    let path = self.state_path(part, step);
    write_json(&path, state)
  }

  /// Remove the state of `step` and every later step of `part`.
  pub fn invalidate_from(&self, part: &str, step: Step) -> Result<(), EngineError> {
    for later in Step::ALL.into_iter().filter(|s| *s >= step) {
      let path = self.state_path(part, later);
      if path.exists() {
        fs::remove_file(&path)
          .map_err(|e| EngineError::io(format!("failed to remove state file {}", path.display()), e))?;
      }
    }
    Ok(())
  }
}

fn write_json(path: &Path, state: &StepState) -> Result<(), EngineError> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)
      .map_err(|e| EngineError::io(format!("failed to create state directory {}", parent.display()), e))?;
  }
  let json = serde_json::to_string_pretty(state)
    .map_err(|e| EngineError::Internal(format!("failed to serialize step state: {}", e)))?;
  // Atomic replace.
  let tmp = path.with_extension("json.tmp");
  fs::write(&tmp, json).map_err(|e| EngineError::io(format!("failed to write state file {}", tmp.display()), e))?;
  fs::rename(&tmp, path).map_err(|e| EngineError::io(format!("failed to write state file {}", path.display()), e))
}
