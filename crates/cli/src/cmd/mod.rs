mod clean;
mod info;
mod lifecycle;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use partcraft_lib::consts::APP_NAME;
use partcraft_lib::engine::EngineFactory;
use partcraft_lib::engine::local::LocalEngine;
use partcraft_lib::lifecycle::{Lifecycle, LifecycleOptions};
use partcraft_lib::platform::{host_deb_arch, paths};
use partcraft_lib::project::{AppMetadata, Project};
use partcraft_lib::step::Features;

use crate::output::TerminalEmitter;

pub use clean::cmd_clean;
pub use info::cmd_info;
pub use lifecycle::cmd_lifecycle;

/// Global command-line options shared by every command.
pub struct ProjectContext {
  pub project_file: PathBuf,
  pub work_dir: Option<PathBuf>,
  pub cache_dir: Option<PathBuf>,
  pub build_for: Option<String>,
  pub enable_overlay: bool,
}

impl ProjectContext {
  fn app(&self) -> AppMetadata {
    let work_dir_name = format!(".{}", APP_NAME);
    AppMetadata::new(APP_NAME)
      .with_source_ignore_patterns(&[work_dir_name.as_str()])
      .with_features(Features {
        enable_overlay: self.enable_overlay,
      })
  }

  fn options(&self) -> Result<LifecycleOptions> {
    let parent = self
      .project_file
      .parent()
      .filter(|p| !p.as_os_str().is_empty())
      .unwrap_or(Path::new("."));
    let project_dir = dunce::canonicalize(parent)
      .with_context(|| format!("Failed to resolve project directory {}", parent.display()))?;

    Ok(LifecycleOptions {
      work_dir: self.work_dir.clone().unwrap_or_else(|| paths::work_dir(&project_dir)),
      cache_dir: self.cache_dir.clone().unwrap_or_else(paths::cache_dir),
      build_for: self.build_for.clone().unwrap_or_else(host_deb_arch),
      project_dir,
    })
  }

  /// Load the project and return a lifecycle that is set up and ready to run.
  pub fn lifecycle(&self) -> Result<Lifecycle<impl EngineFactory<Engine = LocalEngine>, TerminalEmitter>> {
    let project = Project::from_yaml_file(&self.project_file)?;
    let options = self.options()?;
    debug!(
      project = %project.name,
      work_dir = %options.work_dir.display(),
      build_for = %options.build_for,
      "loaded project"
    );

    let mut lifecycle = Lifecycle::with_emitter(self.app(), project, options, LocalEngine::new, TerminalEmitter);
    lifecycle.setup()?;
    Ok(lifecycle)
  }
}

/// `None` when no part names were given on the command line.
fn selected_parts(parts: &[String]) -> Option<&[String]> {
  (!parts.is_empty()).then_some(parts)
}
