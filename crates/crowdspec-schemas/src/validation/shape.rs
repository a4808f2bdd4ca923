//! Reading typed fields out of untrusted JSON objects
//!
//! The entity-schema layer never fails on the first problem: an
//! [`ObjectReader`] records every shape error it meets and the caller decides
//! at [`ObjectReader::finish`] whether the record can be built.
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crate::models::Presence;
use crate::validation::base::{ValidationContext, ValidationHelpers, MIN_URL_LENGTH};
use crate::validation::error::{ValidationError, ValidationErrors, ValidationResult};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use url::Url;
use uuid::Uuid;

/// Human name of a JSON value's type, for error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_error(expected: &str, value: &Value, context: &ValidationContext) -> ValidationError {
    ValidationError::with_violations(
        crate::validation::ErrorKind::Shape,
        context.path.clone(),
        format!("Expected {}, found {}", expected, type_name(value)),
        vec![ValidationError::create_violation("type", expected, type_name(value))],
    )
    .with_input(value.clone())
}

/// Cursor over the members of one JSON object
pub struct ObjectReader<'a> {
    object: &'a Map<String, Value>,
    context: &'a ValidationContext,
    known: BTreeSet<&'static str>,
    errors: ValidationErrors,
}

impl<'a> ObjectReader<'a> {
    /// Start reading `value`, which must be a JSON object
    pub fn new(value: &'a Value, context: &'a ValidationContext) -> Result<Self, ValidationErrors> {
        match value {
            Value::Object(object) => Ok(Self {
                object,
                context,
                known: BTreeSet::new(),
                errors: ValidationErrors::new(),
            }),
            other => Err(type_error("object", other, context).into()),
        }
    }

    pub fn context(&self) -> &ValidationContext {
        self.context
    }

    /// Record an error found while reading
    pub fn push_error(&mut self, error: ValidationError) {
        self.errors.add(error);
    }

    /// Key presence as a tri-state, without parsing the value
    pub fn presence(&mut self, key: &'static str) -> Presence<&'a Value> {
        self.known.insert(key);
        match self.object.get(key) {
            None => Presence::Absent,
            Some(Value::Null) => Presence::Null,
            Some(value) => Presence::Value(value),
        }
    }

    /// Raw value of a key; `None` when absent or null
    pub fn raw(&mut self, key: &'static str) -> Option<&'a Value> {
        self.presence(key).into_option()
    }

    /// Parse a key that must be present and non-null
    pub fn required<T, F>(&mut self, key: &'static str, parse: F) -> Option<T>
    where
        F: FnOnce(&'a Value, &ValidationContext) -> ValidationResult<T>,
    {
        let child = self.context.child(key);
        match self.raw(key) {
            Some(value) => match parse(value, &child) {
                Ok(parsed) => Some(parsed),
                Err(error) => {
                    self.errors.add(error);
                    None
                }
            },
            None => {
                self.missing(key);
                None
            }
        }
    }

    fn missing(&mut self, key: &'static str) {
        self.errors.add(ValidationError::with_violations(
            crate::validation::ErrorKind::Shape,
            self.context.path.child(key),
            format!("Required field {} is missing", key),
            vec![ValidationError::create_violation(
                "required_field",
                format!("{} to be present", key),
                "field is missing",
            )],
        ));
    }

    /// Parse a key that may be absent or null
    pub fn optional<T, F>(&mut self, key: &'static str, parse: F) -> Option<T>
    where
        F: FnOnce(&'a Value, &ValidationContext) -> ValidationResult<T>,
    {
        self.optional_presence(key, parse).into_option()
    }

    /// Parse a key keeping the absent/null distinction
    pub fn optional_presence<T, F>(&mut self, key: &'static str, parse: F) -> Presence<T>
    where
        F: FnOnce(&'a Value, &ValidationContext) -> ValidationResult<T>,
    {
        let child = self.context.child(key);
        match self.presence(key) {
            Presence::Absent => Presence::Absent,
            Presence::Null => Presence::Null,
            Presence::Value(value) => match parse(value, &child) {
                Ok(parsed) => Presence::Value(parsed),
                Err(error) => {
                    self.errors.add(error);
                    Presence::Absent
                }
            },
        }
    }

    /// Parse an optional key whose parser reports several errors at once
    pub fn optional_nested<T, F>(&mut self, key: &'static str, parse: F) -> Option<T>
    where
        F: FnOnce(&'a Value, &ValidationContext) -> Result<T, ValidationErrors>,
    {
        let child = self.context.child(key);
        let value = self.raw(key)?;
        match parse(value, &child) {
            Ok(parsed) => Some(parsed),
            Err(errors) => {
                self.errors.extend(errors);
                None
            }
        }
    }

    /// Parse an optional array whose elements report several errors each
    pub fn optional_list<T, F>(&mut self, key: &'static str, mut parse: F) -> Option<Vec<T>>
    where
        F: FnMut(&'a Value, &ValidationContext) -> Result<T, ValidationErrors>,
    {
        let child = self.context.child(key);
        let value = self.raw(key)?;
        let Value::Array(items) = value else {
            self.errors.add(type_error("array", value, &child));
            return None;
        };

        let mut parsed = Vec::with_capacity(items.len());
        let mut failed = false;
        for (index, item) in items.iter().enumerate() {
            match parse(item, &child.child_index(index)) {
                Ok(entry) => parsed.push(entry),
                Err(errors) => {
                    failed = true;
                    self.errors.extend(errors);
                }
            }
        }
        (!failed).then_some(parsed)
    }

    /// Like [`ObjectReader::optional_list`] but the key must be present
    pub fn required_list<T, F>(&mut self, key: &'static str, parse: F) -> Option<Vec<T>>
    where
        F: FnMut(&'a Value, &ValidationContext) -> Result<T, ValidationErrors>,
    {
        if self.raw(key).is_none() {
            self.missing(key);
            return None;
        }
        self.optional_list(key, parse)
    }

    /// Close the reader, flagging unknown keys in strict mode
    pub fn finish(mut self) -> Result<(), ValidationErrors> {
        if self.context.is_strict() {
            for key in self.object.keys() {
                if !self.known.contains(key.as_str()) {
                    self.errors.add(
                        ValidationError::with_violations(
                            crate::validation::ErrorKind::Shape,
                            self.context.path.child(key.as_str()),
                            format!("Unknown field '{}' not allowed in Strict mode", key),
                            vec![ValidationError::create_violation(
                                "unknown_field",
                                "known field",
                                key.as_str(),
                            )],
                        )
                        .with_input(self.object[key].clone()),
                    );
                }
            }
        }
        self.errors.into_result()
    }
}

/// Error returned when a reader finished cleanly but a required field was
/// not produced; indicates a parser that forgot to report its failure
pub fn incomplete(context: &ValidationContext, what: &str) -> ValidationErrors {
    ValidationError::shape(context.path.clone(), format!("{} could not be constructed", what)).into()
}

pub fn as_str<'a>(value: &'a Value, context: &ValidationContext) -> ValidationResult<&'a str> {
    value.as_str().ok_or_else(|| type_error("string", value, context))
}

pub fn as_string(value: &Value, context: &ValidationContext) -> ValidationResult<String> {
    as_str(value, context).map(str::to_string)
}

pub fn as_bool(value: &Value, context: &ValidationContext) -> ValidationResult<bool> {
    value.as_bool().ok_or_else(|| type_error("boolean", value, context))
}

/// Strict integer: booleans, floats and strings are rejected
pub fn as_i64(value: &Value, context: &ValidationContext) -> ValidationResult<i64> {
    value.as_i64().ok_or_else(|| type_error("integer", value, context))
}

/// Non-negative integer; a float with no fractional part such as `10.0`
/// is accepted as a count
pub fn as_u64(value: &Value, context: &ValidationContext) -> ValidationResult<u64> {
    if let Some(number) = value.as_u64() {
        return Ok(number);
    }
    if let Some(number) = value.as_f64() {
        ValidationHelpers::validate_non_negative(number, context)?;
        if number.fract() == 0.0 && number < u64::MAX as f64 {
            return Ok(number as u64);
        }
    }
    Err(type_error("non-negative integer", value, context))
}

pub fn as_f64(value: &Value, context: &ValidationContext) -> ValidationResult<f64> {
    value.as_f64().ok_or_else(|| type_error("number", value, context))
}

pub fn as_non_negative_f64(value: &Value, context: &ValidationContext) -> ValidationResult<f64> {
    let number = as_f64(value, context)?;
    ValidationHelpers::validate_non_negative(number, context)?;
    Ok(number)
}

pub fn as_unit_interval(value: &Value, context: &ValidationContext) -> ValidationResult<f64> {
    let number = as_f64(value, context)?;
    ValidationHelpers::validate_range(number, Some(0.0), Some(1.0), context)?;
    Ok(number)
}

pub fn as_url(value: &Value, context: &ValidationContext) -> ValidationResult<Url> {
    ValidationHelpers::validate_url(as_str(value, context)?, MIN_URL_LENGTH, context)
}

pub fn as_uuid(value: &Value, context: &ValidationContext) -> ValidationResult<Uuid> {
    ValidationHelpers::validate_uuid(as_str(value, context)?, context)
}

pub fn as_string_list(value: &Value, context: &ValidationContext) -> ValidationResult<Vec<String>> {
    let Value::Array(items) = value else {
        return Err(type_error("array of strings", value, context));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| as_string(item, &context.child_index(i)))
        .collect()
}

/// Free-form JSON object; values are kept as they are
pub fn as_object(value: &Value, context: &ValidationContext) -> ValidationResult<BTreeMap<String, Value>> {
    match value {
        Value::Object(object) => Ok(object.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        other => Err(type_error("object", other, context)),
    }
}

/// Locale map such as `{"en": "How many cats?"}`
pub fn as_string_map(value: &Value, context: &ValidationContext) -> ValidationResult<BTreeMap<String, String>> {
    let Value::Object(object) = value else {
        return Err(type_error("object of strings", value, context));
    };
    object
        .iter()
        .map(|(k, v)| -> ValidationResult<(String, String)> {
            Ok((k.clone(), as_string(v, &context.child(k.as_str()))?))
        })
        .collect()
}

/// Option key to locale map, the restricted answer set layout
pub fn as_answer_set(
    value: &Value,
    context: &ValidationContext,
) -> ValidationResult<BTreeMap<String, BTreeMap<String, String>>> {
    let Value::Object(object) = value else {
        return Err(type_error("object of locale maps", value, context));
    };
    object
        .iter()
        .map(|(k, v)| -> ValidationResult<(String, BTreeMap<String, String>)> {
            Ok((k.clone(), as_string_map(v, &context.child(k.as_str()))?))
        })
        .collect()
}
