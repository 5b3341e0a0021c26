//! configuration errors raised while building condition trees

use thiserror::Error;

/// error raised by the builder when a definition is malformed
///
/// every variant carries the JSON path of the offending node so a module
/// author can find it (e.g. `conditions[2].condition.unit`)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{path}: expected object, got {found}")]
    NotAnObject { path: String, found: String },

    #[error("{path}: missing 'condition_type'")]
    MissingType { path: String },

    #[error("{path}: unknown condition_type '{name}'")]
    UnknownType { path: String, name: String },

    #[error("{path}: missing required field '{field}'")]
    MissingField { path: String, field: &'static str },

    #[error("{path}: field '{field}' must be {expected}")]
    InvalidField {
        path: String,
        field: &'static str,
        expected: &'static str,
    },

    #[error("{path}: unknown operator '{operator}'")]
    UnknownOperator { path: String, operator: String },

    #[error("{path}: operator '{operator}' cannot be applied to {operand}")]
    InapplicableOperator {
        path: String,
        operator: String,
        operand: &'static str,
    },

    #[error("{path}: unit '{unit}' not supported in {context}")]
    UnsupportedUnit {
        path: String,
        unit: String,
        context: &'static str,
    },

    #[error("{path}: unknown vital sign '{name}'")]
    UnknownVitalSign { path: String, name: String },

    #[error("{path}: requires either 'codes' or 'referenced_by_attribute'")]
    MissingCodeSource { path: String },
}

impl ConfigError {
    /// JSON path of the node that failed to build
    pub fn path(&self) -> &str {
        match self {
            ConfigError::NotAnObject { path, .. }
            | ConfigError::MissingType { path }
            | ConfigError::UnknownType { path, .. }
            | ConfigError::MissingField { path, .. }
            | ConfigError::InvalidField { path, .. }
            | ConfigError::UnknownOperator { path, .. }
            | ConfigError::InapplicableOperator { path, .. }
            | ConfigError::UnsupportedUnit { path, .. }
            | ConfigError::UnknownVitalSign { path, .. }
            | ConfigError::MissingCodeSource { path } => path,
        }
    }
}
