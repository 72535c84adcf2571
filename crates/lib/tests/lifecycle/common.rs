//! Shared helpers for lifecycle integration tests.

use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use partcraft_lib::engine::EngineFactory;
use partcraft_lib::engine::local::LocalEngine;
use partcraft_lib::lifecycle::{Emitter, Lifecycle, LifecycleOptions};
use partcraft_lib::parallel::EnvironmentView;
use partcraft_lib::project::{AppMetadata, Project};
use tempfile::TempDir;

/// Environment with no parallelism overrides and two CPUs.
pub struct QuietEnv;

impl EnvironmentView for QuietEnv {
  fn var(&self, _name: &str) -> Option<String> {
    None
  }

  fn cpu_count(&self) -> Option<NonZeroUsize> {
    NonZeroUsize::new(2)
  }
}

/// Collects progress messages and action output.
#[derive(Debug, Default)]
pub struct Recorder {
  pub progress: Vec<String>,
  pub output: Vec<u8>,
}

impl Recorder {
  pub fn output_text(&self) -> String {
    String::from_utf8_lossy(&self.output).into_owned()
  }
}

impl Emitter for Recorder {
  fn progress(&mut self, message: &str) {
    self.progress.push(message.to_string());
  }

  fn open_stream(&mut self, _message: &str) -> Box<dyn Write + '_> {
    Box::new(&mut self.output)
  }
}

/// A project directory with its own work and cache directories.
pub struct TestProject {
  pub temp: TempDir,
}

impl TestProject {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn dir(&self) -> &Path {
    self.temp.path()
  }

  pub fn work_dir(&self) -> PathBuf {
    self.dir().join("work")
  }

  /// Write a file relative to the project directory.
  pub fn write(&self, rel: &str, content: &str) {
    let path = self.dir().join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
  }

  pub fn options(&self) -> LifecycleOptions {
    LifecycleOptions {
      project_dir: self.dir().to_path_buf(),
      work_dir: self.work_dir(),
      cache_dir: self.dir().join("cache"),
      build_for: "amd64".to_string(),
    }
  }

  /// A lifecycle for `yaml`, set up and ready to run.
  pub fn lifecycle(&self, yaml: &str) -> Lifecycle<impl EngineFactory<Engine = LocalEngine>, Recorder> {
    self.lifecycle_for(AppMetadata::new("testcraft"), yaml)
  }

  pub fn lifecycle_for(
    &self,
    app: AppMetadata,
    yaml: &str,
  ) -> Lifecycle<impl EngineFactory<Engine = LocalEngine>, Recorder> {
    let mut lifecycle = self.unready_lifecycle(app, yaml);
    lifecycle.setup_with_env(&QuietEnv).unwrap();
    lifecycle
  }

  pub fn unready_lifecycle(
    &self,
    app: AppMetadata,
    yaml: &str,
  ) -> Lifecycle<impl EngineFactory<Engine = LocalEngine>, Recorder> {
    let project: Project = serde_yaml::from_str(yaml).unwrap();
    project.validate().unwrap();
    Lifecycle::with_emitter(app, project, self.options(), LocalEngine::new, Recorder::default())
  }
}
