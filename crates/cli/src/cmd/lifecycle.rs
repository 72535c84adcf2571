//! Implementation of the `pull`, `overlay`, `build`, `stage` and `prime` commands.

use std::time::Instant;

use anyhow::Result;
use tracing::info;

use partcraft_lib::step::Step;

use super::{ProjectContext, selected_parts};
use crate::output::{format_duration, print_stat, print_success};

/// Bring the selected parts (all parts if none are given) up to `step`.
pub fn cmd_lifecycle(ctx: &ProjectContext, step: Step, parts: &[String]) -> Result<()> {
  let started = Instant::now();
  let mut lifecycle = ctx.lifecycle()?;

  lifecycle.run(Some(step.as_str()), selected_parts(parts))?;

  let elapsed = started.elapsed();
  info!(step = %step, elapsed_ms = elapsed.as_millis() as u64, "lifecycle run finished");

  let project = lifecycle.project();
  print_success(&format!(
    "Finished {} for {} in {}",
    step,
    project.name,
    format_duration(elapsed)
  ));
  if let Some(version) = &project.version {
    print_stat("Version", version);
  }
  if step == Step::Prime {
    print_stat("Prime directory", &lifecycle.prime_dir()?.display().to_string());
  }

  Ok(())
}
