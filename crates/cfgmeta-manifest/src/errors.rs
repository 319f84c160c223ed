//! Error handling for cfgmeta-manifest
//!
//! Wraps cfgmeta-core ExError with manifest-specific helpers

use cfgmeta_core::errors::{ExError, ExErrorKind};
use cfgmeta_core::cfgmeta_core_types::schema::OP_PARSE_MANIFEST;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a manifest validation error
pub fn manifest_validation(reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op(OP_PARSE_MANIFEST)
        .with_message(reason.to_string())
}

/// Create a manifest validation error scoped to one definition
pub fn definition_validation(definition: &str, reason: &str) -> ExError {
    manifest_validation(reason).with_definition(definition)
}

/// Create a YAML error
pub fn yaml_error(err: serde_yaml::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(OP_PARSE_MANIFEST)
        .with_message(format!("YAML parse error: {}", err))
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
