//! Error types for the Crowdspec core library
//!
//! This module defines the error taxonomy of remote validation, using
//! thiserror for ergonomic error definitions and anyhow for transport sources.
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crowdspec_schemas::{ErrorKind, FieldPath, ValidationErrors};
use thiserror::Error;

/// Main error type for Crowdspec remote operations
#[derive(Error, Debug)]
pub enum Error {
    /// A field of a fetched document failed its intrinsic constraint
    #[error("Shape validation failed: {0}")]
    Shape(ValidationErrors),

    /// A cross-field rule was violated
    #[error("Rule violation: {0}")]
    Rule(ValidationErrors),

    /// Network or HTTP failure while retrieving a document or probing a URL
    #[error("Failed to fetch {uri}: {message}")]
    Fetch {
        uri: String,
        path: FieldPath,
        status: Option<u16>,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A fetched document contains no entries
    #[error("fetched {uri} is empty")]
    EmptyDocument { uri: String, path: FieldPath },

    /// Taskdata and groundtruth keys disagree
    #[error("All taskdata entries dont have corresponding groundtruth entry")]
    KeyMismatch {
        taskdata_uri: String,
        groundtruth_uri: String,
        /// Taskdata keys without a groundtruth entry
        missing_groundtruth: Vec<String>,
        /// Groundtruth keys without a taskdata entry
        missing_taskdata: Vec<String>,
    },

    /// A fetched body is not valid JSON
    #[error("Fetched {uri} is not valid JSON: {source}")]
    Parse {
        uri: String,
        path: FieldPath,
        #[source]
        source: serde_json::Error,
    },

    /// Verification needs both remote documents
    #[error("Manifest is missing either of groundtruth or taskdata")]
    MissingSource,

    /// Invalid client or validator configuration
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap schema validation errors, choosing the variant by layer
    pub fn from_validation(errors: ValidationErrors) -> Self {
        if errors.is_shape_only() {
            Error::Shape(errors)
        } else {
            Error::Rule(errors)
        }
    }

    /// Validation errors carried by a Shape or Rule error
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Error::Shape(errors) | Error::Rule(errors) => Some(errors),
            _ => None,
        }
    }

    /// Location of the failing field, when the error has one
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Error::Shape(errors) | Error::Rule(errors) => errors.first().map(|e| &e.path),
            Error::Fetch { path, .. } | Error::EmptyDocument { path, .. } | Error::Parse { path, .. } => Some(path),
            _ => None,
        }
    }

    /// HTTP status of a failed fetch
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Fetch { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_missing_discriminant(&self) -> bool {
        self.validation_errors()
            .is_some_and(|errors| errors.iter().any(|e| e.kind == ErrorKind::MissingDiscriminant))
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::from_validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crowdspec_schemas::ValidationError;

    #[test]
    fn test_error_display() {
        let err = Error::EmptyDocument {
            uri: "https://domain.com/groundtruth.json".to_string(),
            path: FieldPath::root().child("groundtruth_uri"),
        };
        assert_eq!(err.to_string(), "fetched https://domain.com/groundtruth.json is empty");
    }

    #[test]
    fn test_validation_errors_pick_variant_by_kind() {
        let shape = ValidationErrors::from(ValidationError::shape(FieldPath::root().child("task_key"), "invalid uuid"));
        assert!(matches!(Error::from(shape), Error::Shape(_)));

        let rule = ValidationErrors::from(ValidationError::rule(
            "datapoint_content",
            FieldPath::root().child("datapoint_uri"),
            "datapoint_uri is missing.",
        ));
        let err = Error::from(rule);
        assert!(matches!(err, Error::Rule(_)));
        assert_eq!(err.path().map(|p| p.to_string()), Some("$.datapoint_uri".to_string()));
    }

    #[test]
    fn test_missing_discriminant_detection() {
        let errors = ValidationErrors::from(ValidationError::missing_discriminant(
            "groundtruth_uri",
            FieldPath::root().child("request_type"),
        ));
        let err = Error::from(errors);
        assert!(err.is_missing_discriminant());
        assert!(!Error::MissingSource.is_missing_discriminant());
    }

    #[test]
    fn test_fetch_status() {
        let err = Error::Fetch {
            uri: "https://domain.com/groundtruth.json".to_string(),
            path: FieldPath::root().child("groundtruth_uri"),
            status: Some(404),
            message: "HTTP 404 Not Found".to_string(),
            source: None,
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("HTTP 404"));
    }
}
