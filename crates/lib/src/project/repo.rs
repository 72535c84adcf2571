//! Auxiliary package repositories.
//!
//! Repositories are declared in the project and rendered as deb822
//! `.sources` stanzas by the execution engine.

use serde::{Deserialize, Serialize};

use super::ProjectError;

const PPA_BASE_URL: &str = "http://ppa.launchpadcontent.net";

/// An APT package repository, either a Launchpad PPA or an arbitrary URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PackageRepository {
  #[serde(rename = "type", default = "default_repository_type")]
  pub kind: String,
  /// PPA shortcut in `owner/name` form.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ppa: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub suites: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub components: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub architectures: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub formats: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub key_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub priority: Option<i32>,
}

fn default_repository_type() -> String {
  "apt".to_string()
}

impl PackageRepository {
  pub fn ppa(name: &str) -> Self {
    Self {
      kind: default_repository_type(),
      ppa: Some(name.to_string()),
      url: None,
      suites: Vec::new(),
      components: Vec::new(),
      architectures: Vec::new(),
      formats: Vec::new(),
      key_id: None,
      priority: None,
    }
  }

  pub fn url(url: &str, suites: &[&str], components: &[&str]) -> Self {
    Self {
      ppa: None,
      url: Some(url.to_string()),
      suites: suites.iter().map(|s| s.to_string()).collect(),
      components: components.iter().map(|s| s.to_string()).collect(),
      ..Self::ppa("")
    }
  }

  /// Check that the declaration describes exactly one usable repository.
  pub fn validate(&self) -> Result<(), ProjectError> {
    if self.kind != "apt" {
      return Err(ProjectError::InvalidRepository(format!(
        "unsupported repository type '{}'",
        self.kind
      )));
    }
    match (&self.ppa, &self.url) {
      (Some(ppa), None) => {
        let valid = ppa
          .split_once('/')
          .is_some_and(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'));
        if !valid {
          return Err(ProjectError::InvalidRepository(format!(
            "invalid PPA '{}': expected 'owner/name'",
            ppa
          )));
        }
      }
      (None, Some(url)) => {
        if url.is_empty() {
          return Err(ProjectError::InvalidRepository("empty repository url".to_string()));
        }
        if self.suites.is_empty() {
          return Err(ProjectError::InvalidRepository(format!(
            "repository '{}' declares no suites",
            url
          )));
        }
      }
      (Some(_), Some(_)) => {
        return Err(ProjectError::InvalidRepository(
          "repository cannot declare both 'ppa' and 'url'".to_string(),
        ));
      }
      (None, None) => {
        return Err(ProjectError::InvalidRepository(
          "repository must declare either 'ppa' or 'url'".to_string(),
        ));
      }
    }
    Ok(())
  }

  /// Stable identifier used for the `.sources` file name.
  pub fn id(&self) -> String {
    let raw = match (&self.ppa, &self.url) {
      (Some(ppa), _) => format!("ppa-{}", ppa),
      (None, Some(url)) => {
        let trimmed = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
        format!("repo-{}", trimmed)
      }
      (None, None) => "repo".to_string(),
    };
    raw
      .chars()
      .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '-' })
      .collect::<String>()
      .trim_end_matches('-')
      .to_string()
  }

  /// Render this repository as a deb822 stanza.
  pub fn to_deb822(&self) -> String {
    let types = if self.formats.is_empty() {
      "deb".to_string()
    } else {
      self.formats.join(" ")
    };

    let (uri, suites, components) = match &self.ppa {
      Some(ppa) => {
        let suites = if self.suites.is_empty() {
          "$(RELEASE)".to_string()
        } else {
          self.suites.join(" ")
        };
        (format!("{}/{}/ubuntu", PPA_BASE_URL, ppa), suites, "main".to_string())
      }
      None => (
        self.url.clone().unwrap_or_default(),
        self.suites.join(" "),
        self.components.join(" "),
      ),
    };

    let mut lines = vec![
      format!("Types: {}", types),
      format!("URIs: {}", uri),
      format!("Suites: {}", suites),
    ];
    if !components.is_empty() {
      lines.push(format!("Components: {}", components));
    }
    if !self.architectures.is_empty() {
      lines.push(format!("Architectures: {}", self.architectures.join(" ")));
    }
    if let Some(key_id) = &self.key_id {
      lines.push(format!("X-Key-Id: {}", key_id));
    }
    if let Some(priority) = self.priority {
      lines.push(format!("X-Priority: {}", priority));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
  }
}
