use super::common::TestProject;

const TWO_PARTS: &str = r#"
name: pair
version: "2.0"
parts:
  left:
    override-build: |
      touch "$CRAFT_PART_INSTALL/left.txt"
  right:
    override-build: |
      mkdir -p "$CRAFT_PART_INSTALL/share"
      touch "$CRAFT_PART_INSTALL/share/right.txt"
"#;

#[test]
fn cleaning_one_part_keeps_the_other() {
  let project = TestProject::new();
  let mut lifecycle = project.lifecycle(TWO_PARTS);
  lifecycle.run(Some("prime"), None).unwrap();

  let prime = lifecycle.prime_dir().unwrap().to_path_buf();
  let stage = project.work_dir().join("stage");
  assert!(prime.join("share/right.txt").exists());

  let names = vec!["right".to_string()];
  lifecycle.clean(Some(&names)).unwrap();

  assert_eq!(lifecycle.emitter().progress.last().map(String::as_str), Some("Cleaning parts: right"));
  assert!(!prime.join("share").exists());
  assert!(!stage.join("share").exists());
  assert!(prime.join("left.txt").exists());
  assert!(!project.work_dir().join("parts/right").exists());

  lifecycle.run(Some("prime"), None).unwrap();
  let progress = &lifecycle.emitter().progress;
  assert!(progress.contains(&"Skipping prime for left (already ran)".to_string()));
  assert!(progress.contains(&"Priming right".to_string()));
}

#[test]
fn cleaning_all_parts_removes_the_work_tree() {
  let project = TestProject::new();
  let mut lifecycle = project.lifecycle(TWO_PARTS);
  lifecycle.run(Some("stage"), None).unwrap();

  lifecycle.clean(None).unwrap();

  assert_eq!(lifecycle.emitter().progress.last().map(String::as_str), Some("Cleaning all parts"));
  for dir in ["parts", "stage", "prime", "overlay"] {
    assert!(!project.work_dir().join(dir).exists(), "{dir} survived clean");
  }

  lifecycle.run(Some("pull"), None).unwrap();
  assert!(lifecycle.emitter().progress.ends_with(&["Pulling left".to_string(), "Pulling right".to_string()]));
}
