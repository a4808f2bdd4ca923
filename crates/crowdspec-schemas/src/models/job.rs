//! Job classification and per-job request configuration
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crate::validation::shape::{as_bool, as_f64, as_i64, as_str, as_url, ObjectReader};
use crate::validation::{ValidationContext, ValidationError, ValidationErrors, ValidationHelpers, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Kind of labeling job; selects which rules and entry schemas apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    ImageLabelBinary,
    ImageLabelMultipleChoice,
    TextFreeEntry,
    TextLabelMultipleSpanSelect,
    TextMultipleChoiceOneOption,
    TextMultipleChoiceMultipleOptions,
    ImageLabelAreaAdjust,
    ImageLabelAreaSelect,
    ImageLabelSinglePolygon,
    ImageLabelMultiplePolygons,
    ImageLabelSemanticSegmentationOneOption,
    ImageLabelSemanticSegmentationMultipleOptions,
    ImageLabelText,
    ImageDragDrop,
    MultiChallenge,
}

impl RequestType {
    pub const ALL: [RequestType; 15] = [
        RequestType::ImageLabelBinary,
        RequestType::ImageLabelMultipleChoice,
        RequestType::TextFreeEntry,
        RequestType::TextLabelMultipleSpanSelect,
        RequestType::TextMultipleChoiceOneOption,
        RequestType::TextMultipleChoiceMultipleOptions,
        RequestType::ImageLabelAreaAdjust,
        RequestType::ImageLabelAreaSelect,
        RequestType::ImageLabelSinglePolygon,
        RequestType::ImageLabelMultiplePolygons,
        RequestType::ImageLabelSemanticSegmentationOneOption,
        RequestType::ImageLabelSemanticSegmentationMultipleOptions,
        RequestType::ImageLabelText,
        RequestType::ImageDragDrop,
        RequestType::MultiChallenge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::ImageLabelBinary => "image_label_binary",
            RequestType::ImageLabelMultipleChoice => "image_label_multiple_choice",
            RequestType::TextFreeEntry => "text_free_entry",
            RequestType::TextLabelMultipleSpanSelect => "text_label_multiple_span_select",
            RequestType::TextMultipleChoiceOneOption => "text_multiple_choice_one_option",
            RequestType::TextMultipleChoiceMultipleOptions => "text_multiple_choice_multiple_options",
            RequestType::ImageLabelAreaAdjust => "image_label_area_adjust",
            RequestType::ImageLabelAreaSelect => "image_label_area_select",
            RequestType::ImageLabelSinglePolygon => "image_label_single_polygon",
            RequestType::ImageLabelMultiplePolygons => "image_label_multiple_polygons",
            RequestType::ImageLabelSemanticSegmentationOneOption => "image_label_semantic_segmentation_one_option",
            RequestType::ImageLabelSemanticSegmentationMultipleOptions => {
                "image_label_semantic_segmentation_multiple_options"
            }
            RequestType::ImageLabelText => "image_label_text",
            RequestType::ImageDragDrop => "image_drag_drop",
            RequestType::MultiChallenge => "multi_challenge",
        }
    }

    /// Job types whose datapoints are images that get a content-type probe
    pub fn probes_content_type(&self) -> bool {
        matches!(
            self,
            RequestType::ImageLabelBinary
                | RequestType::ImageLabelMultipleChoice
                | RequestType::TextFreeEntry
                | RequestType::ImageLabelAreaAdjust
                | RequestType::ImageLabelAreaSelect
                | RequestType::ImageLabelSinglePolygon
                | RequestType::ImageLabelMultiplePolygons
                | RequestType::ImageLabelSemanticSegmentationOneOption
                | RequestType::ImageLabelSemanticSegmentationMultipleOptions
                | RequestType::ImageLabelText
        )
    }

    /// Job types that accept a list of question examples
    pub fn allows_example_list(&self) -> bool {
        matches!(self, RequestType::ImageLabelAreaSelect | RequestType::ImageLabelBinary)
    }

    /// Job types whose request_config choice bounds are checked
    pub fn has_choice_bounds(&self) -> bool {
        matches!(self, RequestType::ImageLabelMultipleChoice | RequestType::ImageLabelAreaSelect)
    }

    pub(crate) fn parse(value: &Value, context: &ValidationContext) -> ValidationResult<Self> {
        let text = as_str(value, context)?;
        text.parse().map_err(|_| {
            let names: Vec<&str> = Self::ALL.iter().map(RequestType::as_str).collect();
            ValidationHelpers::validate_enum_value(text, &names, "request_type", context)
                .err()
                .unwrap_or_else(|| ValidationError::shape(context.path.clone(), "Invalid request_type"))
        })
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|request_type| request_type.as_str() == s)
            .ok_or_else(|| format!("unknown request_type: {}", s))
    }
}

/// How results are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobMode {
    Batch,
    Online,
    InstantDelivery,
}

impl JobMode {
    pub(crate) fn parse(value: &Value, context: &ValidationContext) -> ValidationResult<Self> {
        let text = as_str(value, context)?;
        ValidationHelpers::validate_enum_value(text, &["batch", "online", "instant_delivery"], "job_mode", context)?;
        Ok(match text {
            "batch" => JobMode::Batch,
            "online" => JobMode::Online,
            _ => JobMode::InstantDelivery,
        })
    }
}

/// Annotation shape for area-select style jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeType {
    Point,
    BoundingBox,
    Polygon,
}

impl ShapeType {
    fn parse(value: &Value, context: &ValidationContext) -> ValidationResult<Self> {
        let text = as_str(value, context)?;
        ValidationHelpers::validate_enum_value(text, &["point", "bounding_box", "polygon"], "shape_type", context)?;
        Ok(match text {
            "point" => ShapeType::Point,
            "bounding_box" => ShapeType::BoundingBox,
            _ => ShapeType::Polygon,
        })
    }
}

/// Option key to locale map, e.g. `{"0": {"en": "cat"}}`
pub type AnswerSet = BTreeMap<String, BTreeMap<String, String>>;

/// Locale to text, e.g. `{"en": "Is this a cat?"}`
pub type LocaleMap = BTreeMap<String, String>;

/// Example image shown next to the question
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuestionExample {
    Single(Url),
    Many(Vec<Url>),
}

impl QuestionExample {
    pub fn is_list(&self) -> bool {
        matches!(self, QuestionExample::Many(_))
    }

    pub fn urls(&self) -> Vec<&Url> {
        match self {
            QuestionExample::Single(url) => vec![url],
            QuestionExample::Many(urls) => urls.iter().collect(),
        }
    }

    pub(crate) fn parse(value: &Value, context: &ValidationContext) -> ValidationResult<Self> {
        match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| as_url(item, &context.child_index(i)))
                .collect::<ValidationResult<Vec<_>>>()
                .map(QuestionExample::Many),
            other => as_url(other, context).map(QuestionExample::Single),
        }
    }
}

/// Additional fields shown with the example, a map or a list of maps
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExampleExtraFields {
    Map(BTreeMap<String, String>),
    List(Vec<BTreeMap<String, String>>),
}

impl ExampleExtraFields {
    pub(crate) fn parse(value: &Value, context: &ValidationContext) -> ValidationResult<Self> {
        use crate::validation::shape::as_string_map;
        match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| as_string_map(item, &context.child_index(i)))
                .collect::<ValidationResult<Vec<_>>>()
                .map(ExampleExtraFields::List),
            other => as_string_map(other, context).map(ExampleExtraFields::Map),
        }
    }
}

/// Per-job request tuning
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestConfig {
    pub version: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<ShapeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_points: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_points: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_shapes_per_image: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_shapes_per_image: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restrict_to_coords: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_selection_area_per_shape: Option<i64>,
    pub multiple_choice_max_choices: i64,
    pub multiple_choice_min_choices: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlap_threshold: Option<f64>,
    pub answer_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sig_figs: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_answers_order: Option<bool>,
    pub ignore_case: bool,
    pub enable_hold_time: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            version: 0,
            shape_type: None,
            min_points: None,
            max_points: None,
            min_shapes_per_image: None,
            max_shapes_per_image: None,
            restrict_to_coords: None,
            minimum_selection_area_per_shape: None,
            multiple_choice_max_choices: 1,
            multiple_choice_min_choices: 1,
            overlap_threshold: None,
            answer_type: "str".to_string(),
            max_value: None,
            min_value: None,
            max_length: None,
            min_length: None,
            sig_figs: None,
            keep_answers_order: None,
            ignore_case: false,
            enable_hold_time: false,
        }
    }
}

impl RequestConfig {
    pub(crate) fn parse(value: &Value, context: &ValidationContext) -> Result<Self, ValidationErrors> {
        let mut reader = ObjectReader::new(value, context)?;
        let defaults = Self::default();

        let config = Self {
            version: reader.optional("version", as_i64).unwrap_or(defaults.version),
            shape_type: reader.optional("shape_type", ShapeType::parse),
            min_points: reader.optional("min_points", as_i64),
            max_points: reader.optional("max_points", as_i64),
            min_shapes_per_image: reader.optional("min_shapes_per_image", as_i64),
            max_shapes_per_image: reader.optional("max_shapes_per_image", as_i64),
            restrict_to_coords: reader.optional("restrict_to_coords", as_bool),
            minimum_selection_area_per_shape: reader.optional("minimum_selection_area_per_shape", as_i64),
            multiple_choice_max_choices: reader
                .optional("multiple_choice_max_choices", as_i64)
                .unwrap_or(defaults.multiple_choice_max_choices),
            multiple_choice_min_choices: reader
                .optional("multiple_choice_min_choices", as_i64)
                .unwrap_or(defaults.multiple_choice_min_choices),
            overlap_threshold: reader.optional("overlap_threshold", as_f64),
            answer_type: reader
                .optional("answer_type", crate::validation::shape::as_string)
                .unwrap_or(defaults.answer_type),
            max_value: reader.optional("max_value", as_f64),
            min_value: reader.optional("min_value", as_f64),
            max_length: reader.optional("max_length", as_i64),
            min_length: reader.optional("min_length", as_i64),
            sig_figs: reader.optional("sig_figs", as_i64),
            keep_answers_order: reader.optional("keep_answers_order", as_bool),
            ignore_case: reader.optional("ignore_case", as_bool).unwrap_or(defaults.ignore_case),
            enable_hold_time: reader
                .optional("enable_hold_time", as_bool)
                .unwrap_or(defaults.enable_hold_time),
        };

        reader.finish()?;
        Ok(config)
    }
}
