//! Adoptable project fields.
//!
//! Fields the build may set are reached through a fixed table of accessors,
//! so values can be read and written by name without reflection. Names not
//! in the table cannot be adopted.

use super::Project;

type Getter = fn(&Project) -> Option<&str>;
type Setter = fn(&mut Project, String);

/// Accessors for one adoptable field.
pub struct AdoptableField {
  pub name: &'static str,
  get: Getter,
  set: Setter,
}

impl AdoptableField {
  pub fn get<'a>(&self, project: &'a Project) -> Option<&'a str> {
    (self.get)(project)
  }

  pub fn set(&self, project: &mut Project, value: String) {
    (self.set)(project, value)
  }
}

/// Every project field the build is allowed to set.
pub static ADOPTABLE_FIELDS: &[AdoptableField] = &[
  AdoptableField {
    name: "version",
    get: |p| p.version.as_deref(),
    set: |p, v| p.version = Some(v),
  },
  AdoptableField {
    name: "summary",
    get: |p| p.summary.as_deref(),
    set: |p, v| p.summary = Some(v),
  },
  AdoptableField {
    name: "description",
    get: |p| p.description.as_deref(),
    set: |p, v| p.description = Some(v),
  },
  AdoptableField {
    name: "title",
    get: |p| p.title.as_deref(),
    set: |p, v| p.title = Some(v),
  },
  AdoptableField {
    name: "license",
    get: |p| p.license.as_deref(),
    set: |p, v| p.license = Some(v),
  },
  AdoptableField {
    name: "grade",
    get: |p| p.grade.as_deref(),
    set: |p, v| p.grade = Some(v),
  },
];

/// Look up an adoptable field by name.
pub fn adoptable_field(name: &str) -> Option<&'static AdoptableField> {
  ADOPTABLE_FIELDS.iter().find(|field| field.name == name)
}
