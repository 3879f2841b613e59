//! Error types for the setup crate.

use qexplorer_model::ModelError;
use thiserror::Error;

use crate::simulator::SimulatorError;

/// Errors raised while editing a project or running a computation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SetupError {
    /// A tree edit was rejected.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The simulator failed.
    #[error("Simulator error: {0}")]
    Simulator(#[from] SimulatorError),

    /// An item of another kind was given where `expected` was required.
    #[error("'{name}' is not {expected}")]
    WrongItem {
        /// Display name of the offending item.
        name: String,
        /// Description of the expected kind.
        expected: &'static str,
    },

    /// Variable names must be identifiers that do not shadow a constant.
    #[error("Invalid variable name '{0}'")]
    InvalidVariableName(String),

    /// A compute parameter is out of range.
    #[error("Invalid parameter '{key}' on '{item}': {reason}")]
    InvalidParameter {
        /// Item holding the parameter.
        item: String,
        /// Field key.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The computation was cancelled between sequence steps.
    #[error("Computation cancelled")]
    Cancelled,

    /// The compute thread panicked or vanished.
    #[error("Compute worker stopped unexpectedly")]
    WorkerLost,

    /// A project or state file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Project file extension is neither YAML nor JSON.
    #[error("Unsupported project file '{0}' (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),
}

impl SetupError {
    pub(crate) fn invalid(item: &str, key: &str, reason: impl Into<String>) -> Self {
        SetupError::InvalidParameter {
            item: item.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for setup operations.
pub type SetupResult<T> = Result<T, SetupError>;
