//! Implementation of the `info` command.

use anyhow::Result;
use serde::Serialize;

use super::ProjectContext;
use crate::output::{OutputFormat, print_info, print_json, print_stat};

#[derive(Debug, Serialize)]
struct InfoReport {
  name: String,
  version: Option<String>,
  summary: Option<String>,
  base: Option<String>,
  adopt_info: Option<String>,
  parts: Vec<String>,
  arch: String,
  parallel_build_count: usize,
  work_dir: String,
  prime_dir: String,
  cache_dir: String,
}

pub fn cmd_info(ctx: &ProjectContext, format: OutputFormat) -> Result<()> {
  let lifecycle = ctx.lifecycle()?;
  let project = lifecycle.project();
  let info = lifecycle.project_info()?;

  // Fall back to the value the adopting part recorded in an earlier run.
  let version = project
    .version
    .clone()
    .or_else(|| info.get_project_var("version").map(str::to_string));

  let report = InfoReport {
    name: project.name.clone(),
    version,
    summary: project.summary.clone(),
    base: project.base.clone(),
    adopt_info: project.adopt_info.clone(),
    parts: project.parts.keys().cloned().collect(),
    arch: info.arch.clone(),
    parallel_build_count: info.parallel_build_count.get(),
    work_dir: info.dirs.work_dir.display().to_string(),
    prime_dir: info.dirs.prime_dir.display().to_string(),
    cache_dir: info.cache_dir.display().to_string(),
  };

  if format.is_json() {
    return print_json(&report);
  }

  print_info(&format!("Project: {}", report.name));
  print_stat("Version", report.version.as_deref().unwrap_or("(unset)"));
  if let Some(summary) = &report.summary {
    print_stat("Summary", summary);
  }
  if let Some(base) = &report.base {
    print_stat("Base", base);
  }
  if let Some(part) = &report.adopt_info {
    print_stat("Adopts info from", part);
  }
  print_stat("Parts", &report.parts.join(", "));
  println!();
  print_stat("Architecture", &report.arch);
  print_stat("Parallel build count", &report.parallel_build_count.to_string());
  print_stat("Work directory", &report.work_dir);
  print_stat("Prime directory", &report.prime_dir);
  print_stat("Cache directory", &report.cache_dir);

  Ok(())
}
