//! Project model.
//!
//! A [`Project`] is the declarative description of what to build: its parts,
//! metadata fields (some of which the build may set, see [`fields`]) and
//! auxiliary package repositories. [`AppMetadata`] carries the static facts
//! of the application that drives the lifecycle.

pub mod fields;
pub mod repo;
mod types;

use std::path::Path;

use thiserror::Error;

pub use repo::PackageRepository;
pub use types::*;

#[derive(Debug, Error)]
pub enum ProjectError {
  #[error("failed to read project file {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse project file {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("invalid package repository: {0}")]
  InvalidRepository(String),

  #[error("part '{part}' declared in adopt-info does not exist")]
  UnknownAdoptPart { part: String },

  #[error("project declares no parts")]
  NoParts,
}

impl Project {
  /// Load and validate a project from a YAML file.
  pub fn from_yaml_file(path: &Path) -> Result<Self, ProjectError> {
    let content = std::fs::read_to_string(path).map_err(|source| ProjectError::Read {
      path: path.display().to_string(),
      source,
    })?;
    let project: Project = serde_yaml::from_str(&content).map_err(|source| ProjectError::Parse {
      path: path.display().to_string(),
      source,
    })?;
    project.validate()?;
    Ok(project)
  }

  /// Structural checks that do not need the execution engine.
  pub fn validate(&self) -> Result<(), ProjectError> {
    if self.parts.is_empty() {
      return Err(ProjectError::NoParts);
    }
    if let Some(part) = &self.adopt_info
      && !self.parts.contains_key(part)
    {
      return Err(ProjectError::UnknownAdoptPart { part: part.clone() });
    }
    for repo in &self.package_repositories {
      repo.validate()?;
    }
    Ok(())
  }
}
