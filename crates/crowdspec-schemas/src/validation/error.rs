//! Validation error types for Manifest, TaskData and Groundtruth documents
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// One segment of a field path: an object key or an array index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Position inside an array
    Index(usize),
    /// Key inside an object
    Key(String),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Ordered location of a value inside a document, rooted at `$`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The document root
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from a list of segments
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Path of an object member below this one
    pub fn child<K: Into<String>>(&self, key: K) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    /// Path of an array element below this one
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Re-root this path below `prefix`
    pub fn prefixed(&self, prefix: &FieldPath) -> Self {
        let mut segments = prefix.0.clone();
        segments.extend(self.0.iter().cloned());
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The last key segment, if any
    pub fn leaf_key(&self) -> Option<&str> {
        self.0.iter().rev().find_map(|segment| match segment {
            PathSegment::Key(key) => Some(key.as_str()),
            PathSegment::Index(_) => None,
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.0 {
            match segment {
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Which layer produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A single field failed its intrinsic type, format or range constraint
    Shape,
    /// A cross-field rule was violated
    Rule,
    /// A rule needed `request_type` and it was absent
    MissingDiscriminant,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Shape => write!(f, "shape"),
            ErrorKind::Rule => write!(f, "rule"),
            ErrorKind::MissingDiscriminant => write!(f, "missing discriminant"),
        }
    }
}

/// The constraint behind an error, as expected/actual text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Constraint or rule name, e.g. `uuid` or `taskdata_exclusivity`
    pub rule: String,
    /// What was expected
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, found {}",
            self.rule, self.expected, self.actual
        )
    }
}

/// Validation error with path context, offending input and detailed violations
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub struct ValidationError {
    /// Which layer rejected the document
    pub kind: ErrorKind,
    /// Location of the offending field
    pub path: FieldPath,
    pub message: String,
    /// The offending input, for debugging and logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    /// Detailed violations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema_violations: Vec<Violation>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation error at '{}': {}", self.path, self.message)?;

        if !self.schema_violations.is_empty() {
            write!(f, "\nViolations:")?;
            for violation in &self.schema_violations {
                write!(f, "\n  - {}", violation)?;
            }
        }

        Ok(())
    }
}

impl ValidationError {
    /// Create a new validation error of the given kind
    pub fn new<M>(kind: ErrorKind, path: FieldPath, message: M) -> Self
    where
        M: Into<String>,
    {
        Self {
            kind,
            path,
            message: message.into(),
            input: None,
            schema_violations: Vec::new(),
        }
    }

    /// A field failed its intrinsic constraint
    pub fn shape<M: Into<String>>(path: FieldPath, message: M) -> Self {
        Self::new(ErrorKind::Shape, path, message)
    }

    /// A named cross-field rule failed
    pub fn rule<R, M>(rule: R, path: FieldPath, message: M) -> Self
    where
        R: Into<String>,
        M: Into<String>,
    {
        let message = message.into();
        let mut error = Self::new(ErrorKind::Rule, path, message.clone());
        error.schema_violations.push(Violation {
            rule: rule.into(),
            expected: "rule to hold".to_string(),
            actual: message,
        });
        error
    }

    /// `request_type` was needed by `rule` but is absent
    pub fn missing_discriminant<R: Into<String>>(rule: R, path: FieldPath) -> Self {
        let mut error = Self::new(ErrorKind::MissingDiscriminant, path, "request_type missing");
        error.schema_violations.push(Violation {
            rule: rule.into(),
            expected: "request_type to be resolved".to_string(),
            actual: "request_type is absent".to_string(),
        });
        error
    }

    /// Error carrying explicit violations
    pub fn with_violations<M>(
        kind: ErrorKind,
        path: FieldPath,
        message: M,
        violations: Vec<Violation>,
    ) -> Self
    where
        M: Into<String>,
    {
        Self {
            kind,
            path,
            message: message.into(),
            input: None,
            schema_violations: violations,
        }
    }

    /// Attach the offending input
    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn add_violation(&mut self, violation: Violation) {
        self.schema_violations.push(violation);
    }

    /// Re-root this error below `prefix`
    pub fn prefixed(mut self, prefix: &FieldPath) -> Self {
        self.path = self.path.prefixed(prefix);
        self
    }

    /// Name of the first violated rule, if any
    pub fn rule_name(&self) -> Option<&str> {
        self.schema_violations.first().map(|v| v.rule.as_str())
    }

    /// Build a `Violation` without an error around it
    pub fn create_violation<R, E, A>(rule: R, expected: E, actual: A) -> Violation
    where
        R: Into<String>,
        E: Into<String>,
        A: Into<String>,
    {
        Violation {
            rule: rule.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Multiple validation errors, in the order they were found
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [single] => write!(f, "{}", single),
            errors => {
                write!(f, "{} validation errors:", self.errors.len())?;
                for (i, error) in errors.iter().enumerate() {
                    write!(f, "\n{}. {}", i + 1, error)?;
                }
                Ok(())
            }
        }
    }
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Append in discovery order
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Append every error of `other`
    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn first(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// True when every error came from the entity-schema layer
    pub fn is_shape_only(&self) -> bool {
        self.errors.iter().all(|e| e.kind == ErrorKind::Shape)
    }

    /// Whether any error points exactly at `path`
    pub fn contains_path(&self, path: &FieldPath) -> bool {
        self.errors.iter().any(|e| &e.path == path)
    }

    /// Re-root every error below `prefix`
    pub fn prefixed(self, prefix: &FieldPath) -> Self {
        Self {
            errors: self.errors.into_iter().map(|e| e.prefixed(prefix)).collect(),
        }
    }

    /// `Ok(())` when nothing was collected
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Default for ValidationErrors {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.add(error);
        errors
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_path_display() {
        let path = FieldPath::root().child("taskdata").index(3).child("datapoint_uri");
        assert_eq!(path.to_string(), "$.taskdata[3].datapoint_uri");
        assert_eq!(FieldPath::root().to_string(), "$");
    }

    #[test]
    fn test_field_path_serializes_as_segment_list() {
        let path = FieldPath::from_segments(vec![
            PathSegment::from("taskdata"),
            PathSegment::from(3usize),
            PathSegment::from("datapoint_uri"),
        ]);
        assert_eq!(serde_json::to_value(&path).unwrap(), json!(["taskdata", 3, "datapoint_uri"]));

        let back: FieldPath = serde_json::from_value(json!(["taskdata", 3, "datapoint_uri"])).unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn test_prefixed_error() {
        let error = ValidationError::shape(FieldPath::root().child("task_key"), "invalid uuid")
            .prefixed(&FieldPath::root().child("taskdata_uri").index(0));
        assert_eq!(error.path.to_string(), "$.taskdata_uri[0].task_key");
    }

    #[test]
    fn test_rule_error_carries_rule_name() {
        let error = ValidationError::rule(
            "taskdata_exclusivity",
            FieldPath::root().child("taskdata"),
            "No taskdata or taskdata_uri found in manifest",
        );
        assert_eq!(error.kind, ErrorKind::Rule);
        assert_eq!(error.rule_name(), Some("taskdata_exclusivity"));
        assert!(error.to_string().contains("$.taskdata"));
    }

    #[test]
    fn test_single_error_display_is_unwrapped() {
        let errors = ValidationErrors::from(ValidationError::shape(FieldPath::root(), "boom"));
        assert_eq!(errors.to_string(), "Validation error at '$': boom");
    }
}
