//! CLI smoke tests for partcraft.
//!
//! These tests verify that the CLI commands run end to end against a
//! throwaway project and return appropriate exit codes.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the partcraft binary.
fn partcraft_cmd() -> Command {
  cargo_bin_cmd!("partcraft")
}

/// Create a temp directory holding a project file.
fn temp_project(content: &str) -> TempDir {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join("partcraft.yaml"), content).unwrap();
  temp
}

/// A command pointed at the project in `temp`, with its cache kept inside it.
fn project_cmd(temp: &TempDir) -> Command {
  let mut cmd = partcraft_cmd();
  cmd
    .arg("--project")
    .arg(temp.path().join("partcraft.yaml"))
    .arg("--cache-dir")
    .arg(temp.path().join("cache"))
    .env_remove("PARTCRAFT_PARALLEL_BUILD_COUNT")
    .env_remove("CRAFT_PARALLEL_BUILD_COUNT")
    .env_remove("RUST_LOG");
  cmd
}

/// Single part that installs one file and needs no sources.
const MINIMAL_PROJECT: &str = r#"
name: smoke
version: "1.0"
summary: Smoke test project
parts:
  main:
    override-build: |
      echo "hello from main"
      echo hi > "$CRAFT_PART_INSTALL/hi.txt"
"#;

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  partcraft_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"))
    .stdout(predicate::str::contains("prime"));
}

#[test]
fn version_flag_works() {
  partcraft_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("partcraft"));
}

#[test]
fn missing_subcommand_fails() {
  partcraft_cmd().assert().failure();
}

// =============================================================================
// Project loading
// =============================================================================

#[test]
fn missing_project_file_fails() {
  let temp = TempDir::new().unwrap();
  project_cmd(&temp)
    .arg("pull")
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to read project file"));
}

#[test]
fn project_without_parts_fails() {
  let temp = temp_project("name: empty\nparts: {}\n");
  project_cmd(&temp)
    .arg("pull")
    .assert()
    .failure()
    .stderr(predicate::str::contains("project declares no parts"));
}

#[test]
fn invalid_parallel_build_count_fails() {
  let temp = temp_project(MINIMAL_PROJECT);
  project_cmd(&temp)
    .env("PARTCRAFT_PARALLEL_BUILD_COUNT", "zero")
    .arg("pull")
    .assert()
    .failure()
    .stderr(predicate::str::contains(
      "Value 'zero' is invalid for parameter 'PARTCRAFT_PARALLEL_BUILD_COUNT'",
    ));
}

// =============================================================================
// Lifecycle commands
// =============================================================================

#[cfg(unix)]
#[test]
fn prime_runs_all_steps() {
  let temp = temp_project(MINIMAL_PROJECT);
  project_cmd(&temp)
    .arg("prime")
    .assert()
    .success()
    .stderr(predicate::str::contains("Pulling main"))
    .stderr(predicate::str::contains("hello from main"))
    .stderr(predicate::str::contains("Priming main"))
    .stdout(predicate::str::contains("Finished prime for smoke"));

  assert!(temp.path().join(".partcraft/prime/hi.txt").exists());
}

#[cfg(unix)]
#[test]
fn second_build_skips_finished_steps() {
  let temp = temp_project(MINIMAL_PROJECT);
  project_cmd(&temp).arg("build").assert().success();

  project_cmd(&temp)
    .arg("build")
    .assert()
    .success()
    .stderr(predicate::str::contains("Skipping build for main (already ran)"));
}

#[cfg(unix)]
#[test]
fn unknown_part_fails() {
  let temp = temp_project(MINIMAL_PROJECT);
  project_cmd(&temp)
    .args(["pull", "ghost"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("a part named 'ghost' is not defined"));
}

#[test]
fn overlay_requires_flag() {
  let temp = temp_project(MINIMAL_PROJECT);
  project_cmd(&temp)
    .arg("overlay")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Invalid target step 'overlay'"));
}

#[cfg(unix)]
#[test]
fn custom_work_dir_is_used() {
  let temp = temp_project(MINIMAL_PROJECT);
  let work = temp.path().join("elsewhere");
  project_cmd(&temp)
    .arg("--work-dir")
    .arg(&work)
    .arg("stage")
    .assert()
    .success();

  assert!(work.join("stage/hi.txt").exists());
  assert!(!temp.path().join(".partcraft").exists());
}

#[cfg(unix)]
#[test]
fn clean_removes_work_tree() {
  let temp = temp_project(MINIMAL_PROJECT);
  project_cmd(&temp).arg("prime").assert().success();

  project_cmd(&temp)
    .arg("clean")
    .assert()
    .success()
    .stderr(predicate::str::contains("Cleaning all parts"))
    .stdout(predicate::str::contains("Cleaned all parts"));

  assert!(!temp.path().join(".partcraft/prime").exists());
}

// =============================================================================
// Info
// =============================================================================

#[test]
fn info_text_output() {
  let temp = temp_project(MINIMAL_PROJECT);
  project_cmd(&temp)
    .args(["--build-for", "arm64", "info"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Project: smoke"))
    .stdout(predicate::str::contains("aarch64"));
}

#[test]
fn info_json_output() {
  let temp = temp_project(MINIMAL_PROJECT);
  let output = project_cmd(&temp)
    .env("PARTCRAFT_PARALLEL_BUILD_COUNT", "3")
    .args(["info", "--output", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["name"], "smoke");
  assert_eq!(report["version"], "1.0");
  assert_eq!(report["parallel_build_count"], 3);
  assert_eq!(report["parts"], serde_json::json!(["main"]));
  assert!(report["prime_dir"].as_str().unwrap().ends_with("prime"));
}
