use std::io;

use thiserror::Error;

use crate::engine::EngineError;
use crate::step::Step;

/// Errors surfaced by the lifecycle orchestrator.
///
/// Engine failures never escape as [`EngineError`]; they are classified here
/// at the orchestrator boundary with the engine's diagnostic preserved.
#[derive(Debug, Error)]
pub enum LifecycleError {
  #[error("Invalid target step '{0}'")]
  InvalidStep(String),

  #[error("Value '{value}' is invalid for parameter '{name}'")]
  InvalidParameter { name: String, value: String },

  /// The engine rejected the static configuration.
  #[error("invalid lifecycle configuration: {0}")]
  Configuration(#[source] EngineError),

  /// A planned action, or planning itself, failed.
  #[error("{message}")]
  Execution {
    part: Option<String>,
    step: Option<Step>,
    message: String,
  },

  #[error("{context}: {source}")]
  Io {
    context: String,
    #[source]
    source: io::Error,
  },

  #[error("Parts processing internal error: {0}")]
  Internal(String),

  #[error("project field '{field}' was not set")]
  FieldUnset { field: String },

  /// An operation was invoked in the wrong lifecycle state.
  #[error("{0}")]
  State(String),
}

impl LifecycleError {
  /// Classify an engine failure raised while running `step`.
  pub fn from_engine(err: EngineError, step: Option<Step>) -> Self {
    match err {
      EngineError::Io { context, source } => LifecycleError::Io { context, source },
      EngineError::Internal(message) => LifecycleError::Internal(message),
      other => LifecycleError::Execution {
        part: other.part_name().map(str::to_string),
        step,
        message: other.to_string(),
      },
    }
  }
}
