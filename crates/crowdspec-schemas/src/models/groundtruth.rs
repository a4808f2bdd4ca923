//! Groundtruth entries, one schema per job type
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crate::models::job::RequestType;
use crate::validation::shape::{as_f64, as_i64, as_string, as_string_list, incomplete, type_name, ObjectReader};
use crate::validation::{
    ErrorKind, SchemaValidator, ValidationContext, ValidationError, ValidationErrors, ValidationHelpers,
    ValidationMode, ValidationResult, MIN_URL_LENGTH,
};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use url::Url;
use uuid::Uuid;

/// Entry layouts that have a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundtruthSchema {
    Binary,
    MultipleChoice,
    AreaSelect,
    SpanSelect,
    DragDrop,
}

/// How entries of a groundtruth document are keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Url,
    Uuid,
}

impl GroundtruthSchema {
    /// Entry schema for a job type, `None` when the job type has none
    pub fn for_request_type(request_type: RequestType) -> Option<Self> {
        match request_type {
            RequestType::ImageLabelBinary => Some(GroundtruthSchema::Binary),
            RequestType::ImageLabelMultipleChoice => Some(GroundtruthSchema::MultipleChoice),
            RequestType::ImageLabelAreaSelect
            | RequestType::ImageLabelSinglePolygon
            | RequestType::ImageLabelMultiplePolygons => Some(GroundtruthSchema::AreaSelect),
            RequestType::TextLabelMultipleSpanSelect => Some(GroundtruthSchema::SpanSelect),
            RequestType::ImageDragDrop => Some(GroundtruthSchema::DragDrop),
            RequestType::TextFreeEntry
            | RequestType::TextMultipleChoiceOneOption
            | RequestType::TextMultipleChoiceMultipleOptions
            | RequestType::ImageLabelAreaAdjust
            | RequestType::ImageLabelSemanticSegmentationOneOption
            | RequestType::ImageLabelSemanticSegmentationMultipleOptions
            | RequestType::ImageLabelText
            | RequestType::MultiChallenge => None,
        }
    }

    pub fn key_kind(&self) -> KeyKind {
        match self {
            GroundtruthSchema::DragDrop => KeyKind::Uuid,
            _ => KeyKind::Url,
        }
    }
}

/// One labeled region of an area-select style answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapedEntity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<f64>,
    pub entity_type: String,
    pub entity_coords: Vec<f64>,
}

/// A labeled character range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Span {
    pub start: i64,
    pub end: i64,
    pub label: String,
}

/// Where a drag-drop entity was dropped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub entity_id: i64,
    pub entity_coords: Vec<f64>,
}

/// A validated groundtruth entry value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GroundtruthEntry {
    Binary(Vec<bool>),
    MultipleChoice(Vec<Vec<String>>),
    AreaSelect(Vec<Vec<ShapedEntity>>),
    SpanSelect(Vec<Span>),
    DragDrop(Vec<Placement>),
    /// Job type without an entry schema, accepted as-is in permissive mode
    Unchecked(Value),
}

/// A validated groundtruth entry key
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GroundtruthKey {
    Url(Url),
    Uuid(Uuid),
    /// Position inside an array document
    Position(usize),
    /// Key of a job type without an entry schema
    Unchecked(String),
}

impl fmt::Display for GroundtruthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroundtruthKey::Url(url) => write!(f, "{}", url),
            GroundtruthKey::Uuid(uuid) => write!(f, "{}", uuid),
            GroundtruthKey::Position(index) => write!(f, "{}", index),
            GroundtruthKey::Unchecked(key) => write!(f, "{}", key),
        }
    }
}

fn array<'a>(value: &'a Value, expected: &str, context: &ValidationContext) -> ValidationResult<&'a Vec<Value>> {
    value.as_array().ok_or_else(|| {
        ValidationError::shape(
            context.path.clone(),
            format!("Expected {}, found {}", expected, type_name(value)),
        )
        .with_input(value.clone())
    })
}

fn list_of<T, F>(value: &Value, expected: &str, context: &ValidationContext, mut parse: F) -> Result<Vec<T>, ValidationErrors>
where
    F: FnMut(&Value, &ValidationContext) -> Result<T, ValidationErrors>,
{
    let items = array(value, expected, context)?;
    let mut parsed = Vec::with_capacity(items.len());
    let mut errors = ValidationErrors::new();
    for (i, item) in items.iter().enumerate() {
        match parse(item, &context.child_index(i)) {
            Ok(entry) => parsed.push(entry),
            Err(failures) => errors.extend(failures),
        }
    }
    errors.into_result().map(|_| parsed)
}

fn binary_answer(value: &Value, context: &ValidationContext) -> Result<bool, ValidationErrors> {
    match value {
        Value::Bool(answer) => Ok(*answer),
        Value::String(text) if text == "true" => Ok(true),
        Value::String(text) if text == "false" => Ok(false),
        other => Err(ValidationError::with_violations(
            ErrorKind::Shape,
            context.path.clone(),
            "Expected \"true\" or \"false\"",
            vec![ValidationError::create_violation("binary_answer", "\"true\" or \"false\"", other.to_string())],
        )
        .with_input(other.clone())
        .into()),
    }
}

fn number_list(value: &Value, context: &ValidationContext) -> ValidationResult<Vec<f64>> {
    let items = array(value, "array of numbers", context)?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| as_f64(item, &context.child_index(i)))
        .collect()
}

fn shaped_entity(value: &Value, context: &ValidationContext) -> Result<ShapedEntity, ValidationErrors> {
    let mut reader = ObjectReader::new(value, context)?;
    let entity_name = reader.optional("entity_name", as_f64);
    let entity_type = reader.required("entity_type", as_string);
    let entity_coords = reader.required("entity_coords", number_list);
    reader.finish()?;

    let (Some(entity_type), Some(entity_coords)) = (entity_type, entity_coords) else {
        return Err(incomplete(context, "shaped entity"));
    };
    Ok(ShapedEntity {
        entity_name,
        entity_type,
        entity_coords,
    })
}

fn span(value: &Value, context: &ValidationContext) -> Result<Span, ValidationErrors> {
    let mut reader = ObjectReader::new(value, context)?;
    let start = reader.required("start", as_i64);
    let end = reader.required("end", as_i64);
    let label = reader.required("label", as_string);
    reader.finish()?;

    let (Some(start), Some(end), Some(label)) = (start, end, label) else {
        return Err(incomplete(context, "span"));
    };
    Ok(Span { start, end, label })
}

fn placement(value: &Value, context: &ValidationContext) -> Result<Placement, ValidationErrors> {
    let mut reader = ObjectReader::new(value, context)?;
    let entity_id = reader.required("entity_id", as_i64);
    let entity_coords = reader.required("entity_coords", number_list);
    reader.finish()?;

    let (Some(entity_id), Some(entity_coords)) = (entity_id, entity_coords) else {
        return Err(incomplete(context, "placement"));
    };
    Ok(Placement {
        entity_id,
        entity_coords,
    })
}

/// Validator for groundtruth entries of one job type
#[derive(Debug, Clone, Copy)]
pub struct GroundtruthValidator {
    request_type: RequestType,
}

impl GroundtruthValidator {
    pub fn new(request_type: RequestType) -> Self {
        Self { request_type }
    }

    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    pub fn schema(&self) -> Option<GroundtruthSchema> {
        GroundtruthSchema::for_request_type(self.request_type)
    }

    fn missing_schema(&self, context: &ValidationContext) -> ValidationError {
        ValidationError::with_violations(
            ErrorKind::Shape,
            context.path.clone(),
            format!("No groundtruth entry schema for request_type {}", self.request_type),
            vec![ValidationError::create_violation(
                "groundtruth_schema",
                "request_type with a groundtruth entry schema",
                self.request_type.as_str(),
            )],
        )
    }

    /// Validate the key of an object document entry
    pub fn validate_key(&self, key: &str, context: &ValidationContext) -> ValidationResult<GroundtruthKey> {
        match self.schema() {
            Some(schema) => match schema.key_kind() {
                KeyKind::Url => ValidationHelpers::validate_url(key, MIN_URL_LENGTH, context).map(GroundtruthKey::Url),
                KeyKind::Uuid => ValidationHelpers::validate_uuid(key, context).map(GroundtruthKey::Uuid),
            },
            None if context.mode() == ValidationMode::Strict => Err(self.missing_schema(context)),
            None => Ok(GroundtruthKey::Unchecked(key.to_string())),
        }
    }

    /// Validate every entry of a groundtruth document
    ///
    /// An object document is keyed by its member names, an array document by
    /// position. Errors are reported under `<key>` or `[index]`.
    pub fn validate_document(
        &self,
        document: &Value,
        context: &ValidationContext,
    ) -> Result<Vec<(GroundtruthKey, GroundtruthEntry)>, ValidationErrors> {
        let mut entries = Vec::new();
        let mut errors = ValidationErrors::new();

        match document {
            Value::Object(object) => {
                for (key, value) in object {
                    let entry_context = context.child(key.as_str());
                    let parsed = self
                        .validate_key(key, &entry_context)
                        .map_err(ValidationErrors::from)
                        .and_then(|key| Ok((key, self.validate_with_context(value, &entry_context)?)));
                    match parsed {
                        Ok(entry) => entries.push(entry),
                        Err(failures) => errors.extend(failures),
                    }
                    if context.config.limit_reached(errors.len()) {
                        break;
                    }
                }
            }
            Value::Array(items) => {
                for (i, value) in items.iter().enumerate() {
                    match self.validate_with_context(value, &context.child_index(i)) {
                        Ok(entry) => entries.push((GroundtruthKey::Position(i), entry)),
                        Err(failures) => errors.extend(failures),
                    }
                    if context.config.limit_reached(errors.len()) {
                        break;
                    }
                }
            }
            other => {
                errors.add(
                    ValidationError::shape(
                        context.path.clone(),
                        format!("Expected object or array, found {}", type_name(other)),
                    )
                    .with_input(other.clone()),
                );
            }
        }

        errors.into_result().map(|_| entries)
    }
}

impl SchemaValidator for GroundtruthValidator {
    type Output = GroundtruthEntry;

    fn validate_with_context(&self, input: &Value, context: &ValidationContext) -> Result<GroundtruthEntry, ValidationErrors> {
        let Some(schema) = self.schema() else {
            if context.is_strict() {
                return Err(self.missing_schema(context).into());
            }
            return Ok(GroundtruthEntry::Unchecked(input.clone()));
        };

        match schema {
            GroundtruthSchema::Binary => {
                list_of(input, "array of \"true\"/\"false\"", context, binary_answer).map(GroundtruthEntry::Binary)
            }
            GroundtruthSchema::MultipleChoice => list_of(input, "array of string arrays", context, |v, c| {
                as_string_list(v, c).map_err(ValidationErrors::from)
            })
            .map(GroundtruthEntry::MultipleChoice),
            GroundtruthSchema::AreaSelect => list_of(input, "array of entity arrays", context, |v, c| {
                list_of(v, "array of entities", c, shaped_entity)
            })
            .map(GroundtruthEntry::AreaSelect),
            GroundtruthSchema::SpanSelect => {
                list_of(input, "array of spans", context, span).map(GroundtruthEntry::SpanSelect)
            }
            GroundtruthSchema::DragDrop => {
                list_of(input, "array of placements", context, placement).map(GroundtruthEntry::DragDrop)
            }
        }
    }
}
