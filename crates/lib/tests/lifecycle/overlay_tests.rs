use partcraft_lib::lifecycle::LifecycleError;
use partcraft_lib::project::AppMetadata;
use partcraft_lib::step::Features;

use super::common::TestProject;

const WITH_REPOSITORIES: &str = r#"
name: layered
version: "3.1"
package-repositories:
  - type: apt
    ppa: owner/tools
parts:
  base:
    overlay-script: |
      test -f "$CRAFT_OVERLAY/etc/apt/sources.list.d/ppa-owner-tools.sources"
      mkdir -p "$CRAFT_OVERLAY/opt"
      touch "$CRAFT_OVERLAY/opt/base"
  top:
    overlay-script: |
      touch "$CRAFT_OVERLAY/opt/top"
"#;

fn overlay_app() -> AppMetadata {
  AppMetadata::new("testcraft").with_features(Features { enable_overlay: true })
}

#[test]
fn overlay_step_sees_installed_repositories() {
  let project = TestProject::new();
  let mut lifecycle = project.lifecycle_for(overlay_app(), WITH_REPOSITORIES);

  lifecycle.run(Some("overlay"), None).unwrap();

  let work = project.work_dir();
  assert!(work.join("repositories/ppa-owner-tools.sources").exists());
  assert!(work.join("overlay/opt/base").exists());
  assert!(work.join("overlay/opt/top").exists());
  assert_eq!(
    lifecycle.emitter().progress,
    vec!["Pulling base", "Pulling top", "Overlaying base", "Overlaying top"]
  );

  // Running again re-installs repositories without tripping over the
  // already registered overlay hook.
  lifecycle.run(Some("overlay"), None).unwrap();
  assert!(
    lifecycle
      .emitter()
      .progress
      .ends_with(&["Skipping overlay for base (already ran)".to_string(), "Skipping overlay for top (already ran)".to_string()])
  );
}

#[test]
fn overlay_step_requires_feature() {
  let project = TestProject::new();
  let mut lifecycle = project.lifecycle(WITH_REPOSITORIES);

  let err = lifecycle.run(Some("overlay"), None).unwrap_err();
  assert!(matches!(err, LifecycleError::InvalidStep(ref step) if step == "overlay"));
}
