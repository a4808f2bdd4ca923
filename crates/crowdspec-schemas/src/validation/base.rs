//! Base validation trait and field-level validators
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crate::validation::error::{ErrorKind, FieldPath, ValidationError, ValidationErrors};
use crate::validation::ValidationConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

/// How unknown fields and unknown groundtruth shapes are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Unknown fields are rejected; groundtruth for request types without an
    /// entry schema is rejected
    Strict,
    /// Unknown fields are ignored; groundtruth for request types without an
    /// entry schema is accepted unchecked
    #[default]
    Permissive,
}

/// Validation context for passing the current path and configuration
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Current field path
    pub path: FieldPath,
    /// Active configuration
    pub config: ValidationConfig,
}

impl ValidationContext {
    /// Create a root context
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            path: FieldPath::root(),
            config,
        }
    }

    /// Create a child context with updated path
    pub fn child<K: Into<String>>(&self, key: K) -> Self {
        Self {
            path: self.path.child(key),
            config: self.config.clone(),
        }
    }

    /// Create a child context for array index
    pub fn child_index(&self, index: usize) -> Self {
        Self {
            path: self.path.index(index),
            config: self.config.clone(),
        }
    }

    pub fn mode(&self) -> ValidationMode {
        self.config.mode
    }

    pub fn is_strict(&self) -> bool {
        self.config.mode == ValidationMode::Strict
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

/// Base trait for document validators
///
/// Implementors turn an untrusted JSON value into a validated record.
pub trait SchemaValidator {
    /// The validated record
    type Output;

    /// Validate with the default configuration
    fn validate(&self, input: &Value) -> Result<Self::Output, ValidationErrors> {
        let context = ValidationContext::default();
        self.validate_with_context(input, &context)
    }

    /// Validate with a specific context
    fn validate_with_context(
        &self,
        input: &Value,
        context: &ValidationContext,
    ) -> Result<Self::Output, ValidationErrors>;

    /// Validate in strict mode
    fn validate_strict(&self, input: &Value) -> Result<Self::Output, ValidationErrors> {
        let context = ValidationContext::new(ValidationConfig::strict());
        self.validate_with_context(input, &context)
    }

    /// Collect all validation errors (non-failing)
    fn collect_errors(&self, input: &Value) -> ValidationErrors {
        let context = ValidationContext::new(ValidationConfig::default().collect_all());
        match self.validate_with_context(input, &context) {
            Ok(_) => ValidationErrors::new(),
            Err(errors) => errors,
        }
    }
}

/// Default minimum length of any URL field
pub const MIN_URL_LENGTH: usize = 10;

/// Helper functions for single-field constraint checks
pub struct ValidationHelpers;

impl ValidationHelpers {
    fn shape_error(
        context: &ValidationContext,
        message: String,
        rule: &str,
        expected: String,
        actual: String,
    ) -> ValidationError {
        ValidationError::with_violations(
            ErrorKind::Shape,
            context.path.clone(),
            message,
            vec![ValidationError::create_violation(rule, expected, actual)],
        )
    }

    /// Validate an http(s) URL with a host and a minimum length
    pub fn validate_url(
        value: &str,
        min_length: usize,
        context: &ValidationContext,
    ) -> Result<Url, ValidationError> {
        if value.len() < min_length {
            return Err(Self::shape_error(
                context,
                format!("URL must be at least {} characters long", min_length),
                "url_length",
                format!("at least {} characters", min_length),
                format!("{} characters", value.len()),
            )
            .with_input(Value::String(value.to_string())));
        }

        let url = Url::parse(value).map_err(|e| {
            Self::shape_error(
                context,
                format!("Invalid URL: {}", e),
                "url_format",
                "valid URL with scheme and host".to_string(),
                value.to_string(),
            )
            .with_input(Value::String(value.to_string()))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Self::shape_error(
                context,
                format!("Invalid URL scheme: {}", url.scheme()),
                "url_scheme",
                "one of: http, https".to_string(),
                url.scheme().to_string(),
            )
            .with_input(Value::String(value.to_string())));
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(Self::shape_error(
                context,
                "URL host required".to_string(),
                "url_host",
                "URL with a host".to_string(),
                value.to_string(),
            )
            .with_input(Value::String(value.to_string())));
        }

        Ok(url)
    }

    /// Validate UUID text
    pub fn validate_uuid(value: &str, context: &ValidationContext) -> Result<Uuid, ValidationError> {
        Uuid::parse_str(value).map_err(|e| {
            Self::shape_error(
                context,
                format!("Invalid UUID: {}", e),
                "uuid_format",
                "hyphenated UUID".to_string(),
                value.to_string(),
            )
            .with_input(Value::String(value.to_string()))
        })
    }

    /// Validate string length bounds (in characters)
    pub fn validate_str_len(
        value: &str,
        min: Option<usize>,
        max: Option<usize>,
        context: &ValidationContext,
    ) -> Result<(), ValidationError> {
        let len = value.chars().count();
        let too_short = min.is_some_and(|min| len < min);
        let too_long = max.is_some_and(|max| len > max);
        if !too_short && !too_long {
            return Ok(());
        }

        let expected = match (min, max) {
            (Some(min), Some(max)) => format!("between {} and {} characters", min, max),
            (Some(min), None) => format!("at least {} characters", min),
            (None, Some(max)) => format!("at most {} characters", max),
            (None, None) => "any length".to_string(),
        };
        Err(Self::shape_error(
            context,
            format!("String length {} is out of bounds, expected {}", len, expected),
            "string_length",
            expected,
            format!("{} characters", len),
        )
        .with_input(Value::String(value.to_string())))
    }

    /// Validate an inclusive numeric range
    pub fn validate_range(
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
        context: &ValidationContext,
    ) -> Result<(), ValidationError> {
        let below = min.is_some_and(|min| value < min);
        let above = max.is_some_and(|max| value > max);
        if value.is_finite() && !below && !above {
            return Ok(());
        }

        let expected = match (min, max) {
            (Some(min), Some(max)) => format!("value in [{}, {}]", min, max),
            (Some(min), None) => format!("value >= {}", min),
            (None, Some(max)) => format!("value <= {}", max),
            (None, None) => "finite value".to_string(),
        };
        Err(Self::shape_error(
            context,
            format!("Value {} is out of range, expected {}", value, expected),
            "numeric_range",
            expected,
            value.to_string(),
        )
        .with_input(serde_json::json!(value)))
    }

    /// Validate a non-negative, finite decimal
    pub fn validate_non_negative(value: f64, context: &ValidationContext) -> Result<(), ValidationError> {
        Self::validate_range(value, Some(0.0), None, context)
    }

    /// Validate that a string is one of allowed values
    pub fn validate_enum_value(
        value: &str,
        allowed_values: &[&str],
        field_name: &str,
        context: &ValidationContext,
    ) -> Result<(), ValidationError> {
        if allowed_values.contains(&value) {
            Ok(())
        } else {
            Err(Self::shape_error(
                context,
                format!("Invalid value for {}: {}", field_name, value),
                "enum_value",
                format!("one of: {}", allowed_values.join(", ")),
                value.to_string(),
            )
            .with_input(Value::String(value.to_string())))
        }
    }

    /// Validate that a string is already lowercase
    pub fn validate_lowercase(value: &str, context: &ValidationContext) -> Result<(), ValidationError> {
        if value == value.to_lowercase() {
            Ok(())
        } else {
            Err(Self::shape_error(
                context,
                "use lowercase".to_string(),
                "lowercase",
                "lowercase text".to_string(),
                value.to_string(),
            )
            .with_input(Value::String(value.to_string())))
        }
    }
}
