//! Project variable adoption.

use tracing::debug;

use super::LifecycleError;
use crate::engine::ExecutionEngine;
use crate::project::fields::adoptable_field;
use crate::project::{AppMetadata, Project};

/// Copy the project variables computed by the engine into `project`.
///
/// Only the application's declared variables are touched; a variable the
/// build left unset keeps the project's declared value.
pub fn adopt<E>(engine: &E, app: &AppMetadata, project: &mut Project) -> Result<(), LifecycleError>
where
  E: ExecutionEngine + ?Sized,
{
  for name in &app.project_variables {
    let field = adoptable_field(name)
      .ok_or_else(|| LifecycleError::Internal(format!("'{}' is not an adoptable project field", name)))?;
    if let Some(value) = engine.project_info().get_project_var(name) {
      debug!(field = %name, value = %value, "adopting project variable");
      field.set(project, value.to_string());
    }
  }
  Ok(())
}

/// Fail with [`LifecycleError::FieldUnset`] for the first mandatory field
/// that has no value.
pub fn check_mandatory_fields(app: &AppMetadata, project: &Project) -> Result<(), LifecycleError> {
  for name in &app.mandatory_adoptable_fields {
    let field = adoptable_field(name)
      .ok_or_else(|| LifecycleError::Internal(format!("'{}' is not an adoptable project field", name)))?;
    if field.get(project).is_none_or(str::is_empty) {
      return Err(LifecycleError::FieldUnset { field: name.clone() });
    }
  }
  Ok(())
}
