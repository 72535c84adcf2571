//! Local execution engine.
//!
//! Runs parts directly on the host inside a work tree:
//!
//! ```text
//! <work_dir>/
//!   parts/<part>/{src,build,install,state}
//!   overlay/
//!   stage/
//!   prime/
//!   repositories/
//! ```
//!
//! Each completed step leaves a state file used by the planner to decide what
//! is outdated on the next run. Files a part copies into the shared stage and
//! prime directories are recorded so they can be removed when the part is
//! cleaned or re-staged.

mod dag;
mod exec;
mod fs;
mod plan;
mod state;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use self::dag::PartGraph;
use self::fs::IgnoreRules;
use self::plan::Planner;
use self::state::{StateStore, StepState, part_hash};
use super::{Callbacks, EngineConfig, EngineError, ExecutionEngine, ProjectInfo, StepInfo};
use crate::action::{Action, ActionKind};
use crate::consts::CRAFT_ENV_PREFIX;
use crate::project::{PackageRepository, PartSpec};
use crate::step::{Features, Step};

const PROJECT_VARS_FILE: &str = "project-vars";

pub struct LocalEngine {
  parts: BTreeMap<String, PartSpec>,
  graph: PartGraph,
  store: StateStore,
  hashes: BTreeMap<String, String>,
  sources: BTreeMap<String, PathBuf>,
  ignore: IgnoreRules,
  features: Features,
  initial_vars: BTreeMap<String, String>,
  info: ProjectInfo,
  callbacks: Callbacks,
  overlay_configured: bool,
}

impl LocalEngine {
  /// Validate the part definitions and open the work tree.
  pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
    let graph = PartGraph::from_parts(&config.parts)?;

    if let Some(adopting) = &config.project_vars_part_name
      && !config.parts.contains_key(adopting)
    {
      return Err(EngineError::InvalidParts(format!(
        "project variables part '{}' is not defined",
        adopting
      )));
    }

    let mut hashes = BTreeMap::new();
    let mut sources = BTreeMap::new();
    for (name, spec) in &config.parts {
      hashes.insert(name.clone(), part_hash(spec)?);
      if let Some(source) = &spec.source {
        sources.insert(name.clone(), config.project_dir.join(source));
      }
    }

    let ignore = IgnoreRules::new(&config.ignore_local_sources)?;
    let info = ProjectInfo::new(&config);
    let store = StateStore::new(info.dirs.clone());

    let mut engine = Self {
      parts: config.parts,
      graph,
      store,
      hashes,
      sources,
      ignore,
      features: config.features,
      initial_vars: config.project_vars,
      info,
      callbacks: Callbacks::new(),
      overlay_configured: false,
    };
    engine.restore_project_vars()?;

    debug!(
      parts = engine.parts.len(),
      work_dir = %engine.info.dirs.work_dir.display(),
      "local engine ready"
    );
    Ok(engine)
  }

  /// Reload project variables set by earlier runs of the adopting part.
  fn restore_project_vars(&mut self) -> Result<(), EngineError> {
    let Some(adopting) = self.info.project_vars_part_name.clone() else {
      return Ok(());
    };
    for step in Step::ALL {
      let Some(state) = self.store.load(&adopting, step)? else {
        continue;
      };
      if self.hashes.get(&adopting) != Some(&state.part_hash) {
        continue;
      }
      for (name, value) in &state.project_vars {
        if self.info.project_vars().contains_key(name) {
          self.info.set_project_var(&adopting, name, value)?;
        }
      }
    }
    Ok(())
  }

  fn part(&self, name: &str) -> Result<&PartSpec, EngineError> {
    self.parts.get(name).ok_or_else(|| EngineError::UnknownPart(name.to_string()))
  }

  /// Drop the state of `from` and later steps, removing what they placed in
  /// the shared directories.
  fn invalidate(&self, part: &str, from: Step) -> Result<(), EngineError> {
    let dirs = &self.info.dirs;
    for (step, shared) in [(Step::Stage, &dirs.stage_dir), (Step::Prime, &dirs.prime_dir)] {
      if step < from {
        continue;
      }
      if let Some(state) = self.store.load(part, step)? {
        fs::remove_files(shared, &state.files)?;
      }
    }
    self.store.invalidate_from(part, from)
  }

  fn script_env(&self, part: &str, step: Step, spec: &PartSpec, vars_file: &Path) -> BTreeMap<String, String> {
    let dirs = &self.info.dirs;
    let var = |name: &str| format!("{}_{}", CRAFT_ENV_PREFIX, name);
    let path = |p: &Path| p.display().to_string();

    let mut env = BTreeMap::from([
      (var("PART_NAME"), part.to_string()),
      (var("STEP_NAME"), step.as_str().to_uppercase()),
      (var("PART_SRC"), path(&dirs.part_src_dir(part))),
      (var("PART_BUILD"), path(&dirs.part_build_dir(part))),
      (var("PART_INSTALL"), path(&dirs.part_install_dir(part))),
      (var("OVERLAY"), path(&dirs.overlay_dir)),
      (var("STAGE"), path(&dirs.stage_dir)),
      (var("PRIME"), path(&dirs.prime_dir)),
      (var("ARCH_BUILD_FOR"), self.info.arch.clone()),
      (var("PARALLEL_BUILD_COUNT"), self.info.parallel_build_count.to_string()),
      (var("PROJECT_NAME"), self.info.project_name.clone()),
      (var("PROJECT_VARS_FILE"), path(vars_file)),
    ]);
    env.extend(spec.build_environment.clone());
    env
  }

  /// Run the part's script for `step` in `cwd`, returning the project
  /// variables it assigned.
  fn run_part_script(
    &mut self,
    part: &str,
    step: Step,
    cwd: &Path,
    output: &mut dyn Write,
  ) -> Result<BTreeMap<String, String>, EngineError> {
    let spec = self.part(part)?;
    let Some(script) = spec.script(step) else {
      return Ok(BTreeMap::new());
    };

    let vars_file = self.info.dirs.part_dir(part).join(PROJECT_VARS_FILE);
    if vars_file.exists() {
      std::fs::remove_file(&vars_file)
        .map_err(|e| EngineError::io(format!("failed to remove {}", vars_file.display()), e))?;
    }

    let env = self.script_env(part, step, spec, &vars_file);
    fs::ensure_dir(cwd)?;
    exec::run_script(part, step, script, cwd, &env, output)?;

    if !vars_file.exists() {
      return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(&vars_file)
      .map_err(|e| EngineError::io(format!("failed to read {}", vars_file.display()), e))?;
    let assigned = exec::parse_project_vars(&content).map_err(|message| EngineError::ProjectVariable {
      part: part.to_string(),
      message,
    })?;
    for (name, value) in &assigned {
      self.info.set_project_var(part, name, value)?;
      info!(part = %part, variable = %name, value = %value, "project variable set");
    }
    Ok(assigned)
  }

  fn pull(&self, part: &str, kind: ActionKind) -> Result<(), EngineError> {
    let src_dir = self.info.dirs.part_src_dir(part);
    if kind == ActionKind::Update {
      fs::ensure_dir(&src_dir)?;
    } else {
      fs::reset_dir(&src_dir)?;
    }
    if let Some(source) = self.sources.get(part) {
      if !source.is_dir() {
        return Err(EngineError::InvalidParts(format!(
          "source '{}' of part '{}' is not a directory",
          source.display(),
          part
        )));
      }
      let copied = fs::copy_tree(source, &src_dir, &self.ignore)?;
      debug!(part = %part, files = copied.len(), "pulled local source");
    }
    Ok(())
  }

  fn overlay(&mut self, part: &str) -> Result<(), EngineError> {
    fs::ensure_dir(&self.info.dirs.overlay_dir)?;
    if !self.overlay_configured {
      self
        .callbacks
        .run_configure_overlay(&self.info.dirs.overlay_dir, &self.info)?;
      self.overlay_configured = true;
    }
    debug!(part = %part, "overlay ready");
    Ok(())
  }

  fn build(&self, part: &str, kind: ActionKind) -> Result<(), EngineError> {
    let dirs = &self.info.dirs;
    let build_dir = dirs.part_build_dir(part);
    if kind == ActionKind::Update {
      fs::ensure_dir(&build_dir)?;
    } else {
      fs::reset_dir(&build_dir)?;
    }
    fs::reset_dir(&dirs.part_install_dir(part))?;
    fs::copy_tree(&dirs.part_src_dir(part), &build_dir, &IgnoreRules::none())?;
    Ok(())
  }

  fn migrate(&self, part: &str, from: &Path, to: &Path, files: Option<&[PathBuf]>) -> Result<Vec<PathBuf>, EngineError> {
    let migrated = match files {
      Some(files) => {
        fs::copy_files(from, to, files)?;
        files.to_vec()
      }
      None => fs::copy_tree(from, to, &IgnoreRules::none())?,
    };
    debug!(part = %part, from = %from.display(), to = %to.display(), files = migrated.len(), "migrated files");
    Ok(migrated)
  }

  fn run_step(&mut self, action: &Action, output: &mut dyn Write) -> Result<StepState, EngineError> {
    let part = action.part_name.as_str();
    let step = action.step;
    let dirs = self.info.dirs.clone();

    let mut files = Vec::new();
    let project_vars = match step {
      Step::Pull => {
        self.pull(part, action.kind)?;
        self.run_part_script(part, step, &dirs.part_src_dir(part), output)?
      }
      Step::Overlay => {
        self.overlay(part)?;
        self.run_part_script(part, step, &dirs.overlay_dir, output)?
      }
      Step::Build => {
        self.build(part, action.kind)?;
        let build_dir = dirs.part_build_dir(part);
        if self.part(part)?.script(Step::Build).is_some() {
          self.run_part_script(part, step, &build_dir, output)?
        } else {
          fs::copy_tree(&build_dir, &dirs.part_install_dir(part), &IgnoreRules::none())?;
          BTreeMap::new()
        }
      }
      Step::Stage => {
        fs::ensure_dir(&dirs.stage_dir)?;
        files = self.migrate(part, &dirs.part_install_dir(part), &dirs.stage_dir, None)?;
        self.run_part_script(part, step, &dirs.stage_dir, output)?
      }
      Step::Prime => {
        fs::ensure_dir(&dirs.prime_dir)?;
        let staged = self.store.load(part, Step::Stage)?.map(|s| s.files).unwrap_or_default();
        files = self.migrate(part, &dirs.stage_dir, &dirs.prime_dir, Some(&staged))?;
        self.run_part_script(part, step, &dirs.prime_dir, output)?
      }
    };

    let hash = self.hashes.get(part).cloned().unwrap_or_default();
    let mut state = StepState::new(hash);
    state.files = files;
    state.project_vars = project_vars;
    Ok(state)
  }

  fn step_info(&self, part: &str, step: Step) -> StepInfo {
    StepInfo {
      part_name: part.to_string(),
      step,
      arch: self.info.arch.clone(),
      parallel_build_count: self.info.parallel_build_count,
      work_dir: self.info.dirs.work_dir.clone(),
      prime_dir: self.info.dirs.prime_dir.clone(),
    }
  }

  fn clean_part(&self, part: &str) -> Result<(), EngineError> {
    self.invalidate(part, Step::Pull)?;
    fs::remove_dir(&self.info.dirs.part_dir(part))
  }
}

impl ExecutionEngine for LocalEngine {
  fn project_info(&self) -> &ProjectInfo {
    &self.info
  }

  fn plan(&self, target: Step, part_names: Option<&[String]>) -> Result<Vec<Action>, EngineError> {
    Planner {
      graph: &self.graph,
      store: &self.store,
      features: self.features,
      hashes: &self.hashes,
      sources: &self.sources,
      ignore: &self.ignore,
    }
    .plan(target, part_names)
  }

  fn execute(&mut self, action: &Action, output: &mut dyn Write) -> Result<(), EngineError> {
    let part = action.part_name.as_str();
    self.part(part)?;

    match action.kind {
      ActionKind::Skip => {
        debug!(part = %part, step = %action.step, "step is up to date");
        return Ok(());
      }
      ActionKind::Reapply => {
        debug!(part = %part, step = %action.step, "overlay layer reapplied");
        return Ok(());
      }
      ActionKind::Run | ActionKind::Rerun | ActionKind::Update => {}
    }

    self.invalidate(part, action.step)?;
    let state = self.run_step(action, output)?;
    self.store.save(part, action.step, &state)?;

    let info = self.step_info(part, action.step);
    if self.callbacks.run_post_step(&info) {
      debug!(part = %part, step = %action.step, "post-step callback modified the tree");
    }
    Ok(())
  }

  fn clean(&mut self, part_names: Option<&[String]>) -> Result<(), EngineError> {
    match part_names {
      Some(names) if !names.is_empty() => {
        for name in names {
          self.part(name)?;
        }
        for name in names {
          info!(part = %name, "cleaning part");
          self.clean_part(name)?;
          if self.info.project_vars_part_name.as_deref() == Some(name.as_str()) {
            self.info.reset_project_vars(&self.initial_vars);
          }
        }
      }
      _ => {
        let dirs = self.info.dirs.clone();
        for dir in [
          &dirs.parts_dir,
          &dirs.overlay_dir,
          &dirs.stage_dir,
          &dirs.prime_dir,
          &dirs.repositories_dir,
        ] {
          fs::remove_dir(dir)?;
        }
        self.info.reset_project_vars(&self.initial_vars);
        self.overlay_configured = false;
        info!(work_dir = %dirs.work_dir.display(), "cleaned all parts");
      }
    }
    Ok(())
  }

  fn install_repositories(&mut self, repositories: &[PackageRepository]) -> Result<(), EngineError> {
    let dir = &self.info.dirs.repositories_dir;
    fs::ensure_dir(dir)?;
    for repo in repositories {
      let path = dir.join(format!("{}.sources", repo.id()));
      std::fs::write(&path, repo.to_deb822())
        .map_err(|e| EngineError::io(format!("failed to write {}", path.display()), e))?;
      info!(repository = %repo.id(), path = %path.display(), "installed package repository");
    }
    Ok(())
  }

  fn callbacks_mut(&mut self) -> &mut Callbacks {
    &mut self.callbacks
  }
}
