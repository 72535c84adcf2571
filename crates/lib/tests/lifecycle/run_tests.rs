use partcraft_lib::engine::EngineError;
use partcraft_lib::lifecycle::LifecycleError;
use partcraft_lib::project::AppMetadata;
use partcraft_lib::step::Step;

use super::common::{QuietEnv, TestProject};

const HELLO: &str = r#"
name: hello
summary: Says hello
adopt-info: hello
parts:
  hello:
    source: src
    override-build: |
      echo "building with $CRAFT_PARALLEL_BUILD_COUNT jobs for $CRAFT_ARCH_BUILD_FOR"
      mkdir -p "$CRAFT_PART_INSTALL/bin"
      cp hello.sh "$CRAFT_PART_INSTALL/bin/"
      echo "version=1.0.0" > "$CRAFT_PROJECT_VARS_FILE"
"#;

fn hello_project() -> TestProject {
  let project = TestProject::new();
  project.write("src/hello.sh", "#!/bin/sh\necho hello\n");
  project.write("src/notes.swp", "editor junk");
  project
}

#[test]
fn prime_runs_every_step_and_adopts_version() {
  let project = hello_project();
  let app = AppMetadata::new("testcraft").with_source_ignore_patterns(&["*.swp"]);
  let mut lifecycle = project.lifecycle_for(app, HELLO);

  lifecycle.run(Some("prime"), None).unwrap();

  assert_eq!(
    lifecycle.emitter().progress,
    vec!["Pulling hello", "Building hello", "Staging hello", "Priming hello"]
  );
  assert!(
    lifecycle
      .emitter()
      .output_text()
      .contains("building with 2 jobs for x86_64")
  );

  let prime = lifecycle.prime_dir().unwrap().to_path_buf();
  assert!(prime.join("bin/hello.sh").exists());
  assert!(!project.work_dir().join("parts/hello/src/notes.swp").exists());
  assert_eq!(lifecycle.project().version.as_deref(), Some("1.0.0"));
}

#[test]
fn second_run_skips_completed_steps() {
  let project = hello_project();
  let mut lifecycle = project.lifecycle(HELLO);
  lifecycle.run(Some("prime"), None).unwrap();

  // A fresh lifecycle on the same work tree restores the adopted version.
  let mut lifecycle = project.lifecycle(HELLO);
  lifecycle.run(Some("prime"), None).unwrap();

  assert_eq!(
    lifecycle.emitter().progress,
    vec![
      "Skipping pull for hello (already ran)",
      "Skipping build for hello (already ran)",
      "Skipping stage for hello (already ran)",
      "Skipping prime for hello (already ran)",
    ]
  );
  assert_eq!(lifecycle.project().version.as_deref(), Some("1.0.0"));
}

#[test]
fn changed_part_is_rebuilt() {
  let project = hello_project();
  project.lifecycle(HELLO).run(Some("build"), None).unwrap();

  let changed = HELLO.replace("echo \"building", "echo \"rebuilding");
  let mut lifecycle = project.lifecycle(&changed);
  lifecycle.run(Some("build"), None).unwrap();

  assert_eq!(
    lifecycle.emitter().progress,
    vec![
      "Repulling hello (part properties changed)",
      "Rebuilding hello (part properties changed)"
    ]
  );
}

#[test]
fn dependencies_are_staged_before_dependent_builds() {
  let project = TestProject::new();
  let yaml = r#"
name: stack
version: "0.1"
parts:
  app:
    after: [lib]
    override-build: |
      test -f "$CRAFT_STAGE/include/lib.h"
      touch "$CRAFT_PART_INSTALL/app"
  lib:
    override-build: |
      mkdir -p "$CRAFT_PART_INSTALL/include"
      touch "$CRAFT_PART_INSTALL/include/lib.h"
"#;
  let mut lifecycle = project.lifecycle(yaml);
  let names = vec!["app".to_string()];

  lifecycle.run(Some("build"), Some(&names)).unwrap();

  assert_eq!(
    lifecycle.emitter().progress,
    vec![
      "Pulling app",
      "Pulling lib (required to build 'app')",
      "Building lib (required to build 'app')",
      "Staging lib (required to build 'app')",
      "Building app",
    ]
  );
}

#[test]
fn failing_script_aborts_run() {
  let project = TestProject::new();
  let yaml = r#"
name: broken
adopt-info: broken
parts:
  broken:
    override-build: |
      echo "version=9.9" > "$CRAFT_PROJECT_VARS_FILE"
      echo "about to fail"
      exit 3
  later:
    after: [broken]
"#;
  let mut lifecycle = project.lifecycle(yaml);

  let err = lifecycle.run(Some("stage"), None).unwrap_err();

  match err {
    LifecycleError::Execution { part, step, message } => {
      assert_eq!(part.as_deref(), Some("broken"));
      assert_eq!(step, Some(Step::Build));
      assert!(message.contains("exit code 3"), "unexpected message: {message}");
    }
    other => panic!("expected execution error, got {other:?}"),
  }
  assert!(lifecycle.emitter().output_text().contains("about to fail"));
  assert_eq!(lifecycle.emitter().progress.last().map(String::as_str), Some("Building broken"));
  assert_eq!(lifecycle.project().version, None);
}

#[test]
fn unset_version_is_reported() {
  let project = TestProject::new();
  let yaml = r#"
name: unversioned
parts:
  main: {}
"#;
  let mut lifecycle = project.lifecycle(yaml);

  let err = lifecycle.run(Some("pull"), None).unwrap_err();
  assert!(matches!(err, LifecycleError::FieldUnset { ref field } if field == "version"));
}

#[test]
fn unknown_part_fails_planning() {
  let project = TestProject::new();
  let mut lifecycle = project.lifecycle("name: demo\nversion: '1'\nparts:\n  main: {}\n");
  let names = vec!["ghost".to_string()];

  let err = lifecycle.run(Some("pull"), Some(&names)).unwrap_err();
  assert!(matches!(err, LifecycleError::Execution { part: Some(ref part), .. } if part == "ghost"));
}

#[test]
fn cyclic_parts_are_rejected_at_setup() {
  let project = TestProject::new();
  let yaml = r#"
name: cyclic
version: "1"
parts:
  a:
    after: [b]
  b:
    after: [a]
"#;
  let mut lifecycle = project.unready_lifecycle(AppMetadata::new("testcraft"), yaml);

  let err = lifecycle.setup_with_env(&QuietEnv).unwrap_err();
  assert!(matches!(err, LifecycleError::Configuration(EngineError::InvalidParts(_))));
  assert!(!lifecycle.is_ready());
}
