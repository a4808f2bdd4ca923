//! Webhook and internal configuration blocks
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crate::validation::shape::{as_string_list, as_uuid, ObjectReader};
use crate::validation::{ValidationContext, ValidationError, ValidationErrors, ValidationResult};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Callback registration for job events
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Webhook {
    pub webhook_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_completed: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_completed: Option<Vec<String>>,
}

impl Webhook {
    pub(crate) fn parse(value: &Value, context: &ValidationContext) -> Result<Self, ValidationErrors> {
        let mut reader = ObjectReader::new(value, context)?;
        let webhook_id = reader.required("webhook_id", as_uuid);
        let chunk_completed = reader.optional("chunk_completed", as_string_list);
        let job_completed = reader.optional("job_completed", as_string_list);
        reader.finish()?;

        let Some(webhook_id) = webhook_id else {
            return Err(crate::validation::shape::incomplete(context, "webhook"));
        };
        Ok(Self {
            webhook_id,
            chunk_completed,
            job_completed,
        })
    }
}

/// String, integer or float
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn parse(value: &Value, context: &ValidationContext) -> ValidationResult<Self> {
        match value {
            Value::String(text) => Ok(Scalar::Text(text.clone())),
            Value::Number(number) => match number.as_i64() {
                Some(integer) => Ok(Scalar::Integer(integer)),
                None => number
                    .as_f64()
                    .map(Scalar::Float)
                    .ok_or_else(|| ValidationError::shape(context.path.clone(), "Number out of range")),
            },
            other => Err(ValidationError::shape(
                context.path.clone(),
                format!("Expected string or number, found {}", crate::validation::shape::type_name(other)),
            )
            .with_input(other.clone())),
        }
    }
}

/// One value of the `mitl` block: a scalar or one nested level of scalars
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MitlValue {
    Scalar(Scalar),
    Nested(BTreeMap<String, Scalar>),
}

pub(crate) fn scalar_map(value: &Value, context: &ValidationContext) -> ValidationResult<BTreeMap<String, Scalar>> {
    let Value::Object(object) = value else {
        return Err(ValidationError::shape(context.path.clone(), "Expected object").with_input(value.clone()));
    };
    object
        .iter()
        .map(|(key, v)| -> ValidationResult<(String, Scalar)> {
            Ok((key.clone(), Scalar::parse(v, &context.child(key.as_str()))?))
        })
        .collect()
}

fn mitl_map(value: &Value, context: &ValidationContext) -> ValidationResult<BTreeMap<String, MitlValue>> {
    let Value::Object(object) = value else {
        return Err(ValidationError::shape(context.path.clone(), "Expected object").with_input(value.clone()));
    };
    object
        .iter()
        .map(|(key, v)| -> ValidationResult<(String, MitlValue)> {
            let child = context.child(key.as_str());
            let parsed = match v {
                Value::Object(_) => MitlValue::Nested(scalar_map(v, &child)?),
                other => MitlValue::Scalar(Scalar::parse(other, &child)?),
            };
            Ok((key.clone(), parsed))
        })
        .collect()
}

/// Opaque operator configuration; only its shape is checked
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InternalConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<BTreeMap<String, Scalar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reco: Option<BTreeMap<String, Scalar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<BTreeMap<String, Scalar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other: Option<BTreeMap<String, Scalar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mitl: Option<BTreeMap<String, MitlValue>>,
}

impl InternalConfig {
    pub(crate) fn parse(value: &Value, context: &ValidationContext) -> Result<Self, ValidationErrors> {
        let mut reader = ObjectReader::new(value, context)?;
        let config = Self {
            exchange: reader.optional("exchange", scalar_map),
            reco: reader.optional("reco", scalar_map),
            repo: reader.optional("repo", scalar_map),
            other: reader.optional("other", scalar_map),
            mitl: reader.optional("mitl", mitl_map),
        };
        reader.finish()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_webhook_requires_id() {
        let context = ValidationContext::default();
        let errors = Webhook::parse(&json!({"job_completed": ["http://localhost:8080"]}), &context).unwrap_err();
        assert_eq!(errors.errors[0].path.to_string(), "$.webhook_id");

        let webhook = Webhook::parse(
            &json!({
                "webhook_id": "c26c2e6a-41ab-4218-b39e-6314b760c45c",
                "job_completed": ["http://servicename:4000/api/webhook"]
            }),
            &context,
        )
        .unwrap();
        assert_eq!(webhook.job_completed.unwrap().len(), 1);
    }

    #[test]
    fn test_internal_config_allows_one_nested_level() {
        let context = ValidationContext::default();
        let config = InternalConfig::parse(
            &json!({
                "exchange": {"a": 1, "b": "c"},
                "mitl": {"n": {"x": 1.5}, "flat": "v"}
            }),
            &context,
        )
        .unwrap();
        assert_eq!(config.exchange.unwrap()["a"], Scalar::Integer(1));
        assert!(matches!(config.mitl.unwrap()["n"], MitlValue::Nested(_)));

        let errors = InternalConfig::parse(&json!({"mitl": {"n": {"x": {"deep": 1}}}}), &context).unwrap_err();
        assert_eq!(errors.errors[0].path.to_string(), "$.mitl.n.x");

        assert!(InternalConfig::parse(&json!({"exchange": {"a": true}}), &context).is_err());
    }
}
