//! Lifecycle orchestration.
//!
//! [`Lifecycle`] owns a project and an execution engine. It is created
//! uninitialized; [`Lifecycle::setup`] resolves the execution parameters and
//! creates the engine, after which [`Lifecycle::run`] and
//! [`Lifecycle::clean`] may be called any number of times.
//!
//! A run installs the project's package repositories, asks the engine for a
//! plan, executes the planned actions one after another while reporting
//! progress, and finally adopts the project variables computed by the build.
//! The first failing action aborts the run.

pub mod adopt;
pub mod callback;
mod error;
pub mod progress;
pub mod repositories;

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

pub use error::LifecycleError;
pub use progress::{Emitter, TracingEmitter};

use crate::action::messages;
use crate::engine::{EngineConfig, EngineFactory, ExecutionEngine, ProjectInfo};
use crate::parallel::{EnvironmentView, ProcessEnvironment, resolve_parallel_build_count};
use crate::platform::deb_to_platform;
use crate::project::fields::adoptable_field;
use crate::project::{AppMetadata, Project};
use crate::step::{self, Step};

/// Where and for what the lifecycle builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleOptions {
  /// Directory holding the project file; relative part sources resolve against it.
  pub project_dir: PathBuf,
  pub work_dir: PathBuf,
  pub cache_dir: PathBuf,
  /// Target architecture in packaging (deb) naming, e.g. `amd64`.
  pub build_for: String,
}

/// Drives a project through its lifecycle steps with an execution engine.
pub struct Lifecycle<F: EngineFactory, M: Emitter = TracingEmitter> {
  app: AppMetadata,
  project: Project,
  options: LifecycleOptions,
  factory: F,
  emitter: M,
  engine: Option<F::Engine>,
}

impl<F: EngineFactory> Lifecycle<F> {
  pub fn new(app: AppMetadata, project: Project, options: LifecycleOptions, factory: F) -> Self {
    Self::with_emitter(app, project, options, factory, TracingEmitter)
  }
}

impl<F: EngineFactory, M: Emitter> Lifecycle<F, M> {
  pub fn with_emitter(app: AppMetadata, project: Project, options: LifecycleOptions, factory: F, emitter: M) -> Self {
    Self {
      app,
      project,
      options,
      factory,
      emitter,
      engine: None,
    }
  }

  pub fn is_ready(&self) -> bool {
    self.engine.is_some()
  }

  /// Create the execution engine, reading parallelism from the process environment.
  pub fn setup(&mut self) -> Result<(), LifecycleError> {
    self.setup_with_env(&ProcessEnvironment)
  }

  pub fn setup_with_env(&mut self, env: &impl EnvironmentView) -> Result<(), LifecycleError> {
    if self.engine.is_some() {
      return Err(LifecycleError::State("lifecycle is already set up".to_string()));
    }

    let parallel_build_count = resolve_parallel_build_count(&self.app.name, env)?;
    let arch = deb_to_platform(&self.options.build_for);
    let config = self.engine_config(arch, parallel_build_count);
    debug!(work_dir = %config.work_dir.display(), arch = %config.arch, "initialising lifecycle");

    let mut engine = self.factory.create(config).map_err(LifecycleError::Configuration)?;
    engine
      .callbacks_mut()
      .register_post_step(&[Step::TERMINAL], Box::new(callback::post_prime));

    info!(
      project = %self.project.name,
      parallel_build_count = parallel_build_count.get(),
      "lifecycle ready"
    );
    self.engine = Some(engine);
    Ok(())
  }

  fn engine_config(&self, arch: String, parallel_build_count: NonZeroUsize) -> EngineConfig {
    let project_vars: BTreeMap<String, String> = self
      .app
      .project_variables
      .iter()
      .map(|name| {
        let current = adoptable_field(name)
          .and_then(|field| field.get(&self.project))
          .unwrap_or_default();
        (name.clone(), current.to_string())
      })
      .collect();

    EngineConfig {
      application_name: self.app.name.clone(),
      project_name: self.project.name.clone(),
      parts: self.project.parts.clone(),
      arch,
      project_dir: self.options.project_dir.clone(),
      work_dir: self.options.work_dir.clone(),
      cache_dir: self.options.cache_dir.clone(),
      ignore_local_sources: self.app.source_ignore_patterns.clone(),
      parallel_build_count,
      project_vars_part_name: self.project.adopt_info.clone(),
      project_vars,
      features: self.app.features,
    }
  }

  fn ready_engine(&self) -> Result<&F::Engine, LifecycleError> {
    self
      .engine
      .as_ref()
      .ok_or_else(|| LifecycleError::State("lifecycle is not set up".to_string()))
  }

  /// Bring `part_names` (all parts if `None`) up to the step named `step_name`.
  ///
  /// Without a step name nothing is planned: repositories are installed and
  /// project variables adopted from the existing state.
  pub fn run(&mut self, step_name: Option<&str>, part_names: Option<&[String]>) -> Result<(), LifecycleError> {
    let engine = self
      .engine
      .as_mut()
      .ok_or_else(|| LifecycleError::State("lifecycle is not set up".to_string()))?;

    repositories::install(&self.project.package_repositories, &mut *engine)?;

    let actions = match step_name {
      Some(name) => {
        let target = step::resolve(name, &self.app.features)?;
        debug!(target = %target, parts = ?part_names, "planning");
        let actions = engine
          .plan(target, part_names)
          .map_err(|e| LifecycleError::from_engine(e, Some(target)))?;
        if let Some(action) = actions.iter().find(|action| action.step > target) {
          return Err(LifecycleError::Internal(format!(
            "planned {} for part '{}' past the target step {}",
            action.step, action.part_name, target
          )));
        }
        actions
      }
      None => Vec::new(),
    };

    for action in &actions {
      let message = messages::render(action);
      self.emitter.progress(&message);
      let mut stream = self.emitter.open_stream(&message);
      engine
        .execute(action, stream.as_mut())
        .map_err(|e| LifecycleError::from_engine(e, Some(action.step)))?;
    }

    adopt::adopt(&*engine, &self.app, &mut self.project)?;
    adopt::check_mandatory_fields(&self.app, &self.project)?;
    debug!(actions = actions.len(), "run complete");
    Ok(())
  }

  /// Remove the artifacts of `part_names`, or of every part if `None`.
  pub fn clean(&mut self, part_names: Option<&[String]>) -> Result<(), LifecycleError> {
    let engine = self
      .engine
      .as_mut()
      .ok_or_else(|| LifecycleError::State("lifecycle is not set up".to_string()))?;

    let message = match part_names {
      Some(names) if !names.is_empty() => format!("Cleaning parts: {}", names.join(", ")),
      _ => "Cleaning all parts".to_string(),
    };
    self.emitter.progress(&message);
    engine
      .clean(part_names)
      .map_err(|e| LifecycleError::from_engine(e, None))
  }

  /// The directory holding the primed payload.
  pub fn prime_dir(&self) -> Result<&Path, LifecycleError> {
    Ok(&self.ready_engine()?.project_info().dirs.prime_dir)
  }

  pub fn project_info(&self) -> Result<&ProjectInfo, LifecycleError> {
    Ok(self.ready_engine()?.project_info())
  }

  pub fn engine(&self) -> Option<&F::Engine> {
    self.engine.as_ref()
  }

  pub fn emitter(&self) -> &M {
    &self.emitter
  }

  pub fn project(&self) -> &Project {
    &self.project
  }
}
