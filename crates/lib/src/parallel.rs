//! Parallel build count resolution.
//!
//! The count is a hint forwarded to the execution engine; the lifecycle itself
//! always runs actions one at a time. Resolution order, first match wins:
//!
//! 1. `<APP>_PARALLEL_BUILD_COUNT`
//! 2. `CRAFT_PARALLEL_BUILD_COUNT`
//! 3. `min(cpus, <APP>_MAX_PARALLEL_BUILD_COUNT)`
//! 4. `min(cpus, CRAFT_MAX_PARALLEL_BUILD_COUNT)`
//! 5. `cpus`, or 1 if the CPU count is unknown
//!
//! Empty variables are treated as unset.

use std::num::NonZeroUsize;

use tracing::debug;

use crate::consts::CRAFT_ENV_PREFIX;
use crate::lifecycle::LifecycleError;

/// Read-only view of the process environment.
pub trait EnvironmentView {
  /// Value of an environment variable, if set and valid unicode.
  fn var(&self, name: &str) -> Option<String>;

  /// Number of logical CPUs, if it can be determined.
  fn cpu_count(&self) -> Option<NonZeroUsize>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl EnvironmentView for ProcessEnvironment {
  fn var(&self, name: &str) -> Option<String> {
    std::env::var(name).ok()
  }

  fn cpu_count(&self) -> Option<NonZeroUsize> {
    std::thread::available_parallelism().ok()
  }
}

fn fixed_count_var(prefix: &str) -> String {
  format!("{}_PARALLEL_BUILD_COUNT", prefix)
}

fn max_count_var(prefix: &str) -> String {
  format!("{}_MAX_PARALLEL_BUILD_COUNT", prefix)
}

fn parse_count(name: &str, value: &str) -> Result<NonZeroUsize, LifecycleError> {
  value
    .trim()
    .parse::<usize>()
    .ok()
    .and_then(NonZeroUsize::new)
    .ok_or_else(|| LifecycleError::InvalidParameter {
      name: name.to_string(),
      value: value.to_string(),
    })
}

/// Resolve the parallel build count for `app_name` from the environment.
pub fn resolve_parallel_build_count(
  app_name: &str,
  env: &impl EnvironmentView,
) -> Result<NonZeroUsize, LifecycleError> {
  let app_prefix = app_name.to_uppercase().replace('-', "_");
  let lookup = |name: &str| env.var(name).filter(|value| !value.is_empty());

  for name in [fixed_count_var(&app_prefix), fixed_count_var(CRAFT_ENV_PREFIX)] {
    if let Some(value) = lookup(&name) {
      debug!(variable = %name, value = %value, "using fixed parallel build count");
      return parse_count(&name, &value);
    }
  }

  let cpus = env.cpu_count().unwrap_or(NonZeroUsize::MIN);

  for name in [max_count_var(&app_prefix), max_count_var(CRAFT_ENV_PREFIX)] {
    if let Some(value) = lookup(&name) {
      let max = parse_count(&name, &value)?;
      debug!(variable = %name, max = max.get(), cpus = cpus.get(), "capping parallel build count");
      return Ok(cpus.min(max));
    }
  }

  debug!(cpus = cpus.get(), "using CPU count as parallel build count");
  Ok(cpus)
}
