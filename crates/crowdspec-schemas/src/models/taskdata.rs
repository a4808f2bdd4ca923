//! TaskData entries: one labeling unit each
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crate::models::job::LocaleMap;
use crate::validation::rules::{Outcome, Rule, RuleEngine};
use crate::validation::shape::{as_bool, as_f64, as_i64, as_str, as_string_map, as_url, as_uuid, incomplete, type_name, ObjectReader};
use crate::validation::{
    ErrorKind, SchemaValidator, ValidationContext, ValidationError, ValidationErrors, ValidationHelpers,
    ValidationResult,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;
use uuid::Uuid;

/// Most keys a metadata map may carry
pub const METADATA_MAX_KEYS: usize = 10;
/// Longest string value inside metadata
pub const METADATA_MAX_VALUE_LENGTH: usize = 256;
/// Longest serialized metadata map
pub const METADATA_MAX_SERIALIZED_LENGTH: usize = 1024;
/// Shortest accepted datapoint_hash, after trimming
pub const DATAPOINT_HASH_MIN_LENGTH: usize = 10;

/// Text content, either plain or per locale
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DatapointText {
    Plain(String),
    Localized(LocaleMap),
}

impl DatapointText {
    pub fn is_empty(&self) -> bool {
        match self {
            DatapointText::Plain(text) => text.is_empty(),
            DatapointText::Localized(map) => map.is_empty(),
        }
    }

    fn parse(value: &Value, context: &ValidationContext) -> ValidationResult<Self> {
        match value {
            Value::String(text) => Ok(DatapointText::Plain(text.clone())),
            other => as_string_map(other, context).map(DatapointText::Localized),
        }
    }
}

/// Draggable or background item of a drag-drop datapoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub entity_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_uri: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_coords: Option<Vec<f64>>,
}

impl Entity {
    fn parse(value: &Value, context: &ValidationContext) -> Result<Self, ValidationErrors> {
        let mut reader = ObjectReader::new(value, context)?;
        let entity_id = reader.required("entity_id", as_i64);
        let entity_uri = reader.optional("entity_uri", as_url);
        let entity_coords = reader.optional("entity_coords", number_list);
        reader.finish()?;

        let Some(entity_id) = entity_id else {
            return Err(incomplete(context, "entity"));
        };
        Ok(Self {
            entity_id,
            entity_uri,
            entity_coords,
        })
    }
}

/// Scalar metadata value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// One labeling unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskData {
    pub task_key: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datapoint_uri: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datapoint_text: Option<DatapointText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datapoint_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_text_question: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<Entity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl TaskData {
    fn has_text(&self) -> bool {
        self.datapoint_text.as_ref().is_some_and(|text| !text.is_empty())
    }

    fn has_entities(&self) -> bool {
        self.entities.as_ref().is_some_and(|entities| !entities.is_empty())
    }

    /// Read every field; content rules are not applied
    pub fn shape(value: &Value, context: &ValidationContext) -> Result<Self, ValidationErrors> {
        let mut reader = ObjectReader::new(value, context)?;

        let task_key = reader.required("task_key", as_uuid);
        // An empty string stands for "no uri"
        let datapoint_uri = reader
            .optional("datapoint_uri", |v, c| match v {
                Value::String(text) if text.is_empty() => Ok(None),
                other => as_url(other, c).map(Some),
            })
            .flatten();
        let datapoint_text = reader.optional("datapoint_text", DatapointText::parse);
        let datapoint_hash = reader.optional("datapoint_hash", |v, c| {
            let hash = as_str(v, c)?;
            ValidationHelpers::validate_str_len(hash.trim(), Some(DATAPOINT_HASH_MIN_LENGTH), None, c)?;
            Ok(hash.to_string())
        });
        let is_text_question = reader.optional("is_text_question", as_bool);
        let entities = reader.optional_list("entities", Entity::parse);
        let polygon = reader.optional("polygon", |v, c| {
            let Value::Array(items) = v else {
                return Err(ValidationError::shape(c.path.clone(), "Expected array of integers").with_input(v.clone()));
            };
            items
                .iter()
                .enumerate()
                .map(|(i, item)| as_i64(item, &c.child_index(i)))
                .collect()
        });
        let metadata = reader.optional("metadata", parse_metadata);

        reader.finish()?;

        let Some(task_key) = task_key else {
            return Err(incomplete(context, "taskdata entry"));
        };
        Ok(Self {
            task_key,
            datapoint_uri,
            datapoint_text,
            datapoint_hash,
            is_text_question,
            entities,
            polygon,
            metadata,
        })
    }

    /// Shape plus content rules
    pub fn from_value(value: &Value, context: &ValidationContext) -> Result<Self, ValidationErrors> {
        let entry = Self::shape(value, context)?;
        taskdata_rules().run(entry, context)
    }
}

fn number_list(value: &Value, context: &ValidationContext) -> ValidationResult<Vec<f64>> {
    let Value::Array(items) = value else {
        return Err(ValidationError::shape(context.path.clone(), "Expected array of numbers").with_input(value.clone()));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| as_f64(item, &context.child_index(i)))
        .collect()
}

fn parse_metadata(value: &Value, context: &ValidationContext) -> ValidationResult<Metadata> {
    let Value::Object(object) = value else {
        return Err(ValidationError::shape(context.path.clone(), "Expected object").with_input(value.clone()));
    };
    if object.len() > METADATA_MAX_KEYS {
        return Err(ValidationError::with_violations(
            ErrorKind::Shape,
            context.path.clone(),
            format!("metadata should have at most {} keys", METADATA_MAX_KEYS),
            vec![ValidationError::create_violation(
                "metadata_keys",
                format!("at most {} keys", METADATA_MAX_KEYS),
                format!("{} keys", object.len()),
            )],
        ));
    }

    let serialized = value.to_string().chars().count();
    if serialized > METADATA_MAX_SERIALIZED_LENGTH {
        return Err(ValidationError::with_violations(
            ErrorKind::Shape,
            context.path.clone(),
            format!("metadata should be < {}", METADATA_MAX_SERIALIZED_LENGTH),
            vec![ValidationError::create_violation(
                "metadata_length",
                format!("at most {} characters", METADATA_MAX_SERIALIZED_LENGTH),
                format!("{} characters", serialized),
            )],
        ));
    }

    object
        .iter()
        .map(|(key, entry)| -> ValidationResult<(String, MetadataValue)> {
            let child = context.child(key.as_str());
            let parsed = match entry {
                Value::Null => MetadataValue::Null,
                Value::String(text) => {
                    ValidationHelpers::validate_str_len(text, None, Some(METADATA_MAX_VALUE_LENGTH), &child)?;
                    MetadataValue::Text(text.clone())
                }
                Value::Number(number) => match number.as_i64() {
                    Some(integer) => MetadataValue::Integer(integer),
                    None => MetadataValue::Float(as_f64(entry, &child)?),
                },
                other => {
                    return Err(ValidationError::shape(
                        child.path.clone(),
                        format!("metadata values must be string, number or null, found {}", type_name(other)),
                    )
                    .with_input(other.clone()))
                }
            };
            Ok((key.clone(), parsed))
        })
        .collect()
}

fn datapoint_content(entry: &TaskData, context: &ValidationContext) -> Result<Outcome<TaskData>, ValidationErrors> {
    if entry.datapoint_uri.is_none() && !entry.has_text() && !entry.has_entities() {
        return Err(ValidationError::rule(
            "datapoint_content",
            context.path.child("datapoint_uri"),
            "datapoint_uri is missing.",
        )
        .into());
    }
    Ok(Outcome::Pass)
}

fn text_question(entry: &TaskData, context: &ValidationContext) -> Result<Outcome<TaskData>, ValidationErrors> {
    if entry.is_text_question == Some(true) && !entry.has_text() {
        return Err(ValidationError::rule(
            "text_question",
            context.path.child("datapoint_text"),
            "datapoint_text is missing.",
        )
        .into());
    }
    Ok(Outcome::Pass)
}

/// The TaskData rule sequence
pub fn taskdata_rules() -> RuleEngine<TaskData> {
    RuleEngine::new(vec![
        Rule::new("text_question", text_question),
        Rule::new("datapoint_content", datapoint_content),
    ])
}

/// Validator for a single TaskData entry
#[derive(Debug, Clone, Default)]
pub struct TaskDataValidator;

impl TaskDataValidator {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaValidator for TaskDataValidator {
    type Output = TaskData;

    fn validate_with_context(&self, input: &Value, context: &ValidationContext) -> Result<TaskData, ValidationErrors> {
        TaskData::from_value(input, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_polygon_must_be_integers() {
        let context = ValidationContext::default();
        let value = json!({
            "task_key": "407fdd93-687a-46bb-b578-89eb96b4109d",
            "datapoint_uri": "https://domain.com/file1.jpg",
            "polygon": [1, 2.5]
        });
        let errors = TaskData::shape(&value, &context).unwrap_err();
        assert_eq!(errors.errors[0].path.to_string(), "$.polygon[1]");
    }

    #[test]
    fn test_plain_and_localized_text() {
        let context = ValidationContext::default();
        assert_eq!(
            DatapointText::parse(&json!("question"), &context).unwrap(),
            DatapointText::Plain("question".into())
        );
        assert!(DatapointText::parse(&json!({}), &context).unwrap().is_empty());
        assert!(DatapointText::parse(&json!(3), &context).is_err());
    }

    #[test]
    fn test_metadata_value_types() {
        let context = ValidationContext::default();
        let metadata = parse_metadata(&json!({"a": 1, "b": 1.5, "c": "x", "d": null}), &context).unwrap();
        assert_eq!(metadata["a"], MetadataValue::Integer(1));
        assert_eq!(metadata["d"], MetadataValue::Null);
        assert!(parse_metadata(&json!({"a": [1]}), &context).is_err());
        assert!(parse_metadata(&json!({"a": true}), &context).is_err());
    }
}
