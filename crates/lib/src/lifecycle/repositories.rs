//! Package repository installation.
//!
//! Repositories go onto the base filesystem right away. A configure-overlay
//! hook repeats the installation inside the overlay, so packages installed by
//! overlay scripts can come from the same sources.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::LifecycleError;
use crate::engine::{CallbackError, EngineError, ExecutionEngine, ProjectInfo};
use crate::project::PackageRepository;

/// Name of the overlay hook this installer registers.
pub const OVERLAY_HOOK: &str = "package-repositories";

const OVERLAY_SOURCES_DIR: &str = "etc/apt/sources.list.d";

/// Install `repositories` through `engine`. An empty list is a no-op.
pub fn install<E>(repositories: &[PackageRepository], engine: &mut E) -> Result<(), LifecycleError>
where
  E: ExecutionEngine + ?Sized,
{
  if repositories.is_empty() {
    return Ok(());
  }

  debug!(count = repositories.len(), "installing package repositories");
  engine
    .install_repositories(repositories)
    .map_err(|e| LifecycleError::from_engine(e, None))?;

  let repos = repositories.to_vec();
  let hook = Box::new(move |overlay_dir: &Path, _: &ProjectInfo| write_overlay_sources(overlay_dir, &repos));
  match engine.callbacks_mut().register_configure_overlay(OVERLAY_HOOK, hook) {
    Ok(()) => Ok(()),
    Err(CallbackError::AlreadyRegistered(name)) => {
      debug!(callback = %name, "overlay repository hook already registered");
      Ok(())
    }
  }
}

fn write_overlay_sources(overlay_dir: &Path, repositories: &[PackageRepository]) -> Result<(), EngineError> {
  let dir = overlay_dir.join(OVERLAY_SOURCES_DIR);
  fs::create_dir_all(&dir).map_err(|e| EngineError::io(format!("failed to create {}", dir.display()), e))?;
  for repo in repositories {
    let path = dir.join(format!("{}.sources", repo.id()));
    fs::write(&path, repo.to_deb822()).map_err(|e| EngineError::io(format!("failed to write {}", path.display()), e))?;
    debug!(repository = %repo.id(), path = %path.display(), "installed repository in overlay");
  }
  Ok(())
}
