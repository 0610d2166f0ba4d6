//! Error types for the compliance rules.
//!
//! Rule evaluation itself never fails: every failure inside an evaluator is
//! folded into an `EVALUATION_ERROR` outcome. These errors are returned by the
//! surrounding boundary code (event parsing, configuration loading, tag
//! lookups and reporting).

use thiserror::Error;

/// Result type for compliance operations.
pub type Result<T> = std::result::Result<T, ComplianceError>;

/// Errors that can occur around compliance evaluation.
#[derive(Debug, Error)]
pub enum ComplianceError {
    /// Configuration document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Configuration validation failed.
    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    /// Required field is missing from an event or snapshot.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Invalid field value.
    #[error("Invalid field value for '{field}': {message}")]
    InvalidFieldValue { field: String, message: String },

    /// Snapshot payload does not have the expected shape.
    #[error("Malformed resource configuration: {0}")]
    StructuralError(String),

    /// The external provider failed to supply tags or configuration.
    #[error("Lookup failed for '{resource}': {message}")]
    ProviderLookup { resource: String, message: String },

    /// The reporting collaborator rejected a record or alert.
    #[error("Reporting error: {0}")]
    Reporting(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Reading a configuration file failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl ComplianceError {
    /// Builds a provider lookup error for the given resource.
    pub fn lookup(resource: impl Into<String>, message: impl Into<String>) -> Self {
        ComplianceError::ProviderLookup {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Builds an invalid field error.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ComplianceError::InvalidFieldValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ComplianceError {
    fn from(err: serde_json::Error) -> Self {
        ComplianceError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ComplianceError {
    fn from(err: serde_yaml::Error) -> Self {
        ComplianceError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for ComplianceError {
    fn from(err: std::io::Error) -> Self {
        ComplianceError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_message() {
        let err = ComplianceError::lookup("arn:aws:ec2:us-east-1:1:instance/i-1", "throttled");
        assert_eq!(
            err.to_string(),
            "Lookup failed for 'arn:aws:ec2:us-east-1:1:instance/i-1': throttled"
        );
    }

    #[test]
    fn test_from_json_error() {
        let err: ComplianceError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ComplianceError::SerializationError(_)));
    }
}
