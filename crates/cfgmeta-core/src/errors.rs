use crate::definition::DecodingReason;
use crate::management::ContextError;
use thiserror::Error;

/// Result type alias using ConfigError
pub type Result<T> = std::result::Result<T, ConfigError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers (the CLI, tests, remote
/// tooling) can match on without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Schema / bootstrap
    Schema,
    DefinitionNotFound,
    PropertyNotFound,
    RelationNotFound,

    // Values
    IllegalPropertyValue,
    IllegalPropertyValueString,

    // Resolution
    NoTypeInformation,
    WrongTypeInformation,
    AbstractTypeInformation,

    // Defaults and context
    DefaultBehavior,
    ContextUnavailable,
    Communication,
    ManagedObjectNotFound,

    // Paths
    InvalidPath,

    // Constraints
    ConstraintViolation,

    // Dispatch
    UnknownVariant,

    // Integration
    InvalidConfiguration,
    InvalidInput,
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Schema => "ERR_SCHEMA",
            ExErrorKind::DefinitionNotFound => "ERR_DEFINITION_NOT_FOUND",
            ExErrorKind::PropertyNotFound => "ERR_PROPERTY_NOT_FOUND",
            ExErrorKind::RelationNotFound => "ERR_RELATION_NOT_FOUND",
            ExErrorKind::IllegalPropertyValue => "ERR_ILLEGAL_PROPERTY_VALUE",
            ExErrorKind::IllegalPropertyValueString => "ERR_ILLEGAL_PROPERTY_VALUE_STRING",
            ExErrorKind::NoTypeInformation => "ERR_NO_TYPE_INFORMATION",
            ExErrorKind::WrongTypeInformation => "ERR_WRONG_TYPE_INFORMATION",
            ExErrorKind::AbstractTypeInformation => "ERR_ABSTRACT_TYPE_INFORMATION",
            ExErrorKind::DefaultBehavior => "ERR_DEFAULT_BEHAVIOR",
            ExErrorKind::ContextUnavailable => "ERR_CONTEXT_UNAVAILABLE",
            ExErrorKind::Communication => "ERR_COMMUNICATION",
            ExErrorKind::ManagedObjectNotFound => "ERR_MANAGED_OBJECT_NOT_FOUND",
            ExErrorKind::InvalidPath => "ERR_INVALID_PATH",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::UnknownVariant => "ERR_UNKNOWN_VARIANT",
            ExErrorKind::InvalidConfiguration => "ERR_INVALID_CONFIGURATION",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification used for programmatic handling plus the
/// definition/property context needed to explain a failure.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    definition: Option<String>,
    property: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            definition: None,
            property: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add definition context
    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    /// Add property context
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the definition context, if any
    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    /// Get the property context, if any
    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(definition) = &self.definition {
            write!(f, " (definition: {})", definition)?;
        }
        if let Some(property) = &self.property {
            write!(f, " (property: {})", property)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Errors raised by the metamodel: at bootstrap, while handling values, while
/// resolving definitions and defaults, and while dispatching visitors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Builder incompleteness, invalid bounds, dangling or mismatched
    /// references found while the definition tree is assembled.
    #[error("Schema error: {message}")]
    Schema { message: String },

    /// No definition with this name is registered
    #[error("Definition not found: {name}")]
    DefinitionNotFound { name: String },

    /// Neither the definition nor any ancestor declares the property
    #[error("Property '{property}' is not defined by '{definition}' or its ancestors")]
    PropertyNotFound {
        definition: String,
        property: String,
    },

    /// Neither the definition nor any ancestor declares the relation
    #[error("Relation '{relation}' is not defined by '{definition}' or its ancestors")]
    RelationNotFound {
        definition: String,
        relation: String,
    },

    /// A decoded value violates the property's invariants
    #[error("The value \"{value}\" is not a valid value for the \"{property}\" property: {reason}")]
    IllegalPropertyValue {
        property: String,
        value: String,
        reason: String,
    },

    /// The text could not be decoded as a value of the property
    #[error("The string \"{value}\" is not a valid value for the \"{property}\" property: {reason}")]
    IllegalPropertyValueString {
        property: String,
        value: String,
        reason: String,
    },

    /// External data could not be mapped onto a concrete definition
    #[error("Unable to decode a managed object of type '{definition}': {reason}")]
    DefinitionDecoding {
        definition: String,
        reason: DecodingReason,
    },

    /// A default value could not be determined
    #[error("Unable to determine the default values of the \"{property}\" property: {cause}")]
    DefaultBehavior {
        property: String,
        cause: Box<ConfigError>,
    },

    /// The management context failed
    #[error(transparent)]
    Context(#[from] ContextError),

    /// A path could not be built, parsed or navigated
    #[error("Invalid managed object path \"{path}\": {reason}")]
    InvalidPath { path: String, reason: String },

    /// A visitor reached its fallback arm
    #[error("Visitor {visitor} does not handle {kind}")]
    UnknownVariant { visitor: String, kind: String },

    /// Engine configuration could not be loaded
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl ConfigError {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        ConfigError::Schema {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for the two value-level variants
    pub fn is_value_error(&self) -> bool {
        matches!(
            self,
            ConfigError::IllegalPropertyValue { .. } | ConfigError::IllegalPropertyValueString { .. }
        )
    }
}

/// Conversion from ConfigError to ExError
impl From<ConfigError> for ExError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Schema { message } => {
                ExError::new(ExErrorKind::Schema).with_message(message)
            }

            ConfigError::DefinitionNotFound { name } => ExError::new(ExErrorKind::DefinitionNotFound)
                .with_definition(name)
                .with_message("Definition not found"),

            ConfigError::PropertyNotFound {
                definition,
                property,
            } => ExError::new(ExErrorKind::PropertyNotFound)
                .with_definition(definition)
                .with_property(property)
                .with_message("Property not defined by the definition or its ancestors"),

            ConfigError::RelationNotFound {
                definition,
                relation,
            } => ExError::new(ExErrorKind::RelationNotFound)
                .with_definition(definition)
                .with_message(format!("Relation '{}' not defined", relation)),

            ConfigError::IllegalPropertyValue {
                property,
                value,
                reason,
            } => ExError::new(ExErrorKind::IllegalPropertyValue)
                .with_property(property)
                .with_message(format!("Illegal value \"{}\": {}", value, reason)),

            ConfigError::IllegalPropertyValueString {
                property,
                value,
                reason,
            } => ExError::new(ExErrorKind::IllegalPropertyValueString)
                .with_property(property)
                .with_message(format!("Illegal value string \"{}\": {}", value, reason)),

            ConfigError::DefinitionDecoding { definition, reason } => {
                let kind = match reason {
                    DecodingReason::NoTypeInformation => ExErrorKind::NoTypeInformation,
                    DecodingReason::WrongTypeInformation => ExErrorKind::WrongTypeInformation,
                    DecodingReason::AbstractTypeInformation => ExErrorKind::AbstractTypeInformation,
                };
                ExError::new(kind)
                    .with_definition(definition)
                    .with_message(reason.to_string())
            }

            ConfigError::DefaultBehavior { property, cause } => {
                ExError::new(ExErrorKind::DefaultBehavior)
                    .with_property(property)
                    .with_message("Unable to determine default values")
                    .with_source(ExError::from(*cause))
            }

            ConfigError::Context(err) => {
                let kind = match &err {
                    ContextError::Unavailable { .. } => ExErrorKind::ContextUnavailable,
                    ContextError::Communication { .. } => ExErrorKind::Communication,
                    ContextError::ManagedObjectNotFound { .. } => ExErrorKind::ManagedObjectNotFound,
                };
                ExError::new(kind).with_message(err.to_string())
            }

            ConfigError::InvalidPath { path, reason } => ExError::new(ExErrorKind::InvalidPath)
                .with_message(format!("Invalid path \"{}\": {}", path, reason)),

            ConfigError::UnknownVariant { visitor, kind } => {
                ExError::new(ExErrorKind::UnknownVariant)
                    .with_message(format!("{} does not handle {}", visitor, kind))
            }

            ConfigError::InvalidConfiguration { message } => {
                ExError::new(ExErrorKind::InvalidConfiguration).with_message(message)
            }
        }
    }
}

/// Conversion from toml::de::Error to ConfigError
impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::InvalidConfiguration {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_error_kind_codes() {
        let cases = [
            (ExErrorKind::NoTypeInformation, "ERR_NO_TYPE_INFORMATION"),
            (ExErrorKind::WrongTypeInformation, "ERR_WRONG_TYPE_INFORMATION"),
            (
                ExErrorKind::AbstractTypeInformation,
                "ERR_ABSTRACT_TYPE_INFORMATION",
            ),
            (ExErrorKind::Schema, "ERR_SCHEMA"),
            (ExErrorKind::IllegalPropertyValue, "ERR_ILLEGAL_PROPERTY_VALUE"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_decoding_error_maps_to_reason_kind() {
        let err = ConfigError::DefinitionDecoding {
            definition: "connection-handler".to_string(),
            reason: DecodingReason::AbstractTypeInformation,
        };
        let ex: ExError = err.into();
        assert_eq!(ex.kind(), ExErrorKind::AbstractTypeInformation);
        assert_eq!(ex.definition(), Some("connection-handler"));
    }

    #[test]
    fn test_default_behavior_error_keeps_cause() {
        let err = ConfigError::DefaultBehavior {
            property: "port".to_string(),
            cause: Box::new(ConfigError::Context(ContextError::Communication {
                message: "connection reset".to_string(),
            })),
        };
        assert!(!err.is_value_error());

        let ex: ExError = err.into();
        assert_eq!(ex.code(), "ERR_DEFAULT_BEHAVIOR");
        assert_eq!(ex.property(), Some("port"));
        let source = ex.source_error().expect("source should be kept");
        assert_eq!(source.kind(), ExErrorKind::Communication);
        assert!(ex.to_string().contains("caused by [ERR_COMMUNICATION]"));
    }

    #[test]
    fn test_value_error_message_names_property_and_text() {
        let err = ConfigError::IllegalPropertyValueString {
            property: "listen-port".to_string(),
            value: "http".to_string(),
            reason: "not an integer".to_string(),
        };
        assert!(err.is_value_error());
        let text = err.to_string();
        assert!(text.contains("listen-port"));
        assert!(text.contains("\"http\""));
    }
}
