//! VIA results documents
//!
//! Annotation results for a finished job, one datapoint per labeled image:
//!
//! ```json
//! {
//!     "datapoints": [{
//!         "task_uri": "https://mydomain.com/image.jpg",
//!         "metadata": {"filename": "image.jpg"},
//!         "class_attributes": {
//!             "0": {
//!                 "class_attributes": {"dog": false, "cat": false},
//!                 "regions": [{
//!                     "region_attributes": {"region_key": "region_value"},
//!                     "shape_attributes": {"coords": [1, 2, 3, 4], "name": "shape_type"}
//!                 }]
//!             }
//!         }
//!     }],
//!     "version": 1
//! }
//! ```
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crate::validation::shape::{as_i64, as_object, as_url, incomplete, type_name, ObjectReader};
use crate::validation::{SchemaValidator, ValidationContext, ValidationError, ValidationErrors};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

/// Version written when a document does not say
pub const VIA_DEFAULT_VERSION: i64 = 1;

/// One annotated region: free-form attributes plus its geometry
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Region {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_attributes: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_attributes: Option<BTreeMap<String, Value>>,
}

impl Region {
    fn parse(value: &Value, context: &ValidationContext) -> Result<Self, ValidationErrors> {
        let mut reader = ObjectReader::new(value, context)?;
        let region = Self {
            region_attributes: reader.optional("region_attributes", as_object),
            shape_attributes: reader.optional("shape_attributes", as_object),
        };
        reader.finish()?;
        Ok(region)
    }
}

/// Labels of one class; the inner `class_attributes` map is kept for older
/// producers
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassAttribute {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_attributes: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<Region>>,
}

impl ClassAttribute {
    fn parse(value: &Value, context: &ValidationContext) -> Result<Self, ValidationErrors> {
        let mut reader = ObjectReader::new(value, context)?;
        let class_attributes = reader.optional("class_attributes", as_object);
        let regions = reader.optional_list("regions", Region::parse);
        reader.finish()?;
        Ok(Self {
            class_attributes,
            regions,
        })
    }
}

fn class_attribute_map(
    value: &Value,
    context: &ValidationContext,
) -> Result<BTreeMap<String, ClassAttribute>, ValidationErrors> {
    let Value::Object(object) = value else {
        return Err(ValidationError::shape(
            context.path.clone(),
            format!("Expected object of class attributes, found {}", type_name(value)),
        )
        .with_input(value.clone())
        .into());
    };

    let mut classes = BTreeMap::new();
    let mut errors = ValidationErrors::new();
    for (key, entry) in object {
        match ClassAttribute::parse(entry, &context.child(key.as_str())) {
            Ok(parsed) => {
                classes.insert(key.clone(), parsed);
            }
            Err(entry_errors) => errors.extend(entry_errors),
        }
    }
    errors.into_result()?;
    Ok(classes)
}

/// Results for one labeled image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Datapoint {
    pub task_uri: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_attributes: Option<BTreeMap<String, ClassAttribute>>,
}

impl Datapoint {
    fn parse(value: &Value, context: &ValidationContext) -> Result<Self, ValidationErrors> {
        let mut reader = ObjectReader::new(value, context)?;
        let task_uri = reader.required("task_uri", as_url);
        let metadata = reader.optional("metadata", as_object);
        let class_attributes = reader.optional_nested("class_attributes", class_attribute_map);
        reader.finish()?;

        let Some(task_uri) = task_uri else {
            return Err(incomplete(context, "datapoint"));
        };
        Ok(Self {
            task_uri,
            metadata,
            class_attributes,
        })
    }
}

/// A complete VIA results document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViaDataManifest {
    pub datapoints: Vec<Datapoint>,
    pub version: i64,
}

impl ViaDataManifest {
    pub(crate) fn parse(value: &Value, context: &ValidationContext) -> Result<Self, ValidationErrors> {
        let mut reader = ObjectReader::new(value, context)?;
        let datapoints = reader.required_list("datapoints", Datapoint::parse);
        let version = reader.optional("version", as_i64).unwrap_or(VIA_DEFAULT_VERSION);
        reader.finish()?;

        let Some(datapoints) = datapoints else {
            return Err(incomplete(context, "datapoints"));
        };
        Ok(Self { datapoints, version })
    }

    /// Every `task_uri`, in document order
    pub fn task_uris(&self) -> impl Iterator<Item = &Url> {
        self.datapoints.iter().map(|datapoint| &datapoint.task_uri)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViaDataManifestValidator;

impl ViaDataManifestValidator {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaValidator for ViaDataManifestValidator {
    type Output = ViaDataManifest;

    fn validate_with_context(&self, input: &Value, context: &ValidationContext) -> Result<ViaDataManifest, ValidationErrors> {
        ViaDataManifest::parse(input, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ErrorKind;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "datapoints": [{
                "task_uri": "https://mydomain.com/image.jpg",
                "metadata": {"filename": "image.jpg"},
                "class_attributes": {
                    "0": {
                        "class_attributes": {"dog": false, "cat": false},
                        "regions": [{
                            "region_attributes": {"region_key": "region_value"},
                            "shape_attributes": {"coords": [1, 2, 3, 4, 5, 6, 7, 8], "name": "shape_type"}
                        }]
                    }
                }
            }]
        })
    }

    #[test]
    fn test_full_document_defaults_version() {
        let via = ViaDataManifestValidator::new().validate(&document()).unwrap();
        assert_eq!(via.version, VIA_DEFAULT_VERSION);
        assert_eq!(via.task_uris().map(Url::as_str).collect::<Vec<_>>(), ["https://mydomain.com/image.jpg"]);

        let classes = via.datapoints[0].class_attributes.as_ref().unwrap();
        let regions = classes["0"].regions.as_ref().unwrap();
        assert_eq!(regions[0].shape_attributes.as_ref().unwrap()["name"], "shape_type");
    }

    #[test]
    fn test_datapoints_and_task_uri_are_required() {
        let errors = ViaDataManifestValidator::new().validate(&json!({"version": 2})).unwrap_err();
        assert_eq!(errors.errors[0].path.to_string(), "$.datapoints");

        let errors = ViaDataManifestValidator::new()
            .validate(&json!({"datapoints": [{"metadata": {}}]}))
            .unwrap_err();
        assert_eq!(errors.errors[0].path.to_string(), "$.datapoints[0].task_uri");

        let errors = ViaDataManifestValidator::new()
            .validate(&json!({"datapoints": [{"task_uri": "not a url"}]}))
            .unwrap_err();
        assert_eq!(errors.errors[0].kind, ErrorKind::Shape);
    }

    #[test]
    fn test_class_attribute_shapes() {
        let mut value = document();
        value["datapoints"][0]["class_attributes"]["0"]["regions"] = json!([{"region_attributes": "dog"}]);
        let errors = ViaDataManifestValidator::new().validate(&value).unwrap_err();
        assert_eq!(
            errors.errors[0].path.to_string(),
            "$.datapoints[0].class_attributes.0.regions[0].region_attributes"
        );

        value["datapoints"][0]["class_attributes"] = json!(["0"]);
        assert!(ViaDataManifestValidator::new().validate(&value).is_err());
    }

    #[test]
    fn test_round_trip() {
        let via = ViaDataManifestValidator::new().validate(&document()).unwrap();
        let again = ViaDataManifestValidator::new()
            .validate(&serde_json::to_value(&via).unwrap())
            .unwrap();
        assert_eq!(via, again);
    }
}
