use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::repo::PackageRepository;
use crate::step::{Features, Step};

/// A project as declared in `partcraft.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Project {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub summary: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub base: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub license: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub grade: Option<String>,
  /// Part whose build may set adoptable project fields.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub adopt_info: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub package_repositories: Vec<PackageRepository>,
  pub parts: BTreeMap<String, PartSpec>,
}

/// Build instructions for a single part.
///
/// Scripts run under `/bin/sh -e` in the part's working directory for the
/// step they belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartSpec {
  /// Local directory copied into the part's source directory on pull.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source: Option<String>,
  /// Parts that must be staged before this part builds.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub after: Vec<String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub build_environment: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub override_pull: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub overlay_script: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub override_build: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub override_stage: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub override_prime: Option<String>,
}

impl PartSpec {
  /// The user script for a step, if any.
  pub fn script(&self, step: Step) -> Option<&str> {
    match step {
      Step::Pull => self.override_pull.as_deref(),
      Step::Overlay => self.overlay_script.as_deref(),
      Step::Build => self.override_build.as_deref(),
      Step::Stage => self.override_stage.as_deref(),
      Step::Prime => self.override_prime.as_deref(),
    }
  }
}

/// Static facts about the application driving the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppMetadata {
  /// Application name; also the environment variable prefix.
  pub name: String,
  /// Project fields the build may set.
  pub project_variables: Vec<String>,
  /// Adoptable fields that must hold a value once the lifecycle has run.
  pub mandatory_adoptable_fields: Vec<String>,
  /// Gitignore-style glob patterns skipped when pulling local sources.
  pub source_ignore_patterns: Vec<String>,
  pub features: Features,
}

impl AppMetadata {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      project_variables: vec!["version".to_string()],
      mandatory_adoptable_fields: vec!["version".to_string()],
      source_ignore_patterns: Vec::new(),
      features: Features::default(),
    }
  }

  pub fn with_project_variables(mut self, names: &[&str]) -> Self {
    self.project_variables = names.iter().map(|s| s.to_string()).collect();
    self
  }

  pub fn with_mandatory_fields(mut self, names: &[&str]) -> Self {
    self.mandatory_adoptable_fields = names.iter().map(|s| s.to_string()).collect();
    self
  }

  pub fn with_source_ignore_patterns(mut self, patterns: &[&str]) -> Self {
    self.source_ignore_patterns = patterns.iter().map(|s| s.to_string()).collect();
    self
  }

  pub fn with_features(mut self, features: Features) -> Self {
    self.features = features;
    self
  }
}
