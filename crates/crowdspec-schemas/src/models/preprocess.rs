//! Preprocessing pipeline selection for uploaded datapoints
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crate::models::config::{scalar_map, Scalar};
use crate::validation::shape::{as_str, incomplete, ObjectReader};
use crate::validation::{SchemaValidator, ValidationContext, ValidationErrors, ValidationHelpers, ValidationResult};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Preprocessing pipelines a job can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pipeline {
    FaceBlurPipeline,
    #[serde(rename = "OCRThinFilterPipeline")]
    OcrThinFilterPipeline,
    UploadPipeline,
}

impl Pipeline {
    pub const NAMES: [&'static str; 3] = ["FaceBlurPipeline", "OCRThinFilterPipeline", "UploadPipeline"];

    fn parse(value: &Value, context: &ValidationContext) -> ValidationResult<Self> {
        let name = as_str(value, context)?;
        ValidationHelpers::validate_enum_value(name, &Self::NAMES, "pipeline", context)?;
        Ok(match name {
            "FaceBlurPipeline" => Pipeline::FaceBlurPipeline,
            "OCRThinFilterPipeline" => Pipeline::OcrThinFilterPipeline,
            _ => Pipeline::UploadPipeline,
        })
    }
}

/// A pipeline plus its optional scalar settings
///
/// An absent `config` is left out when serialized; an empty one is kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preprocess {
    pub pipeline: Pipeline,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<BTreeMap<String, Scalar>>,
}

impl Preprocess {
    pub(crate) fn parse(value: &Value, context: &ValidationContext) -> Result<Self, ValidationErrors> {
        let mut reader = ObjectReader::new(value, context)?;
        let pipeline = reader.required("pipeline", Pipeline::parse);
        let config = reader.optional("config", scalar_map);
        reader.finish()?;

        let Some(pipeline) = pipeline else {
            return Err(incomplete(context, "preprocess"));
        };
        Ok(Self { pipeline, config })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PreprocessValidator;

impl PreprocessValidator {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaValidator for PreprocessValidator {
    type Output = Preprocess;

    fn validate_with_context(&self, input: &Value, context: &ValidationContext) -> Result<Preprocess, ValidationErrors> {
        Preprocess::parse(input, context)
    }
}
