//! Worker targeting filter
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crate::validation::shape::{as_i64, as_unit_interval, ObjectReader};
use crate::validation::{
    ErrorKind, SchemaValidator, ValidationContext, ValidationError, ValidationErrors, ValidationHelpers,
    ValidationResult,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

const BROWSERS: &[&str] = &["mobile", "tablet", "desktop", "modern_browser"];
const CONFIDENCES: &[&str] = &["minimum_client_confidence"];

/// Confidence attached to one targeting value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AudienceScore {
    pub score: f64,
}

/// A single-entry map from a dimension value to its score
pub type Restriction = BTreeMap<String, AudienceScore>;

/// Key checks for one targeting dimension
#[derive(Debug, Clone, Copy)]
enum KeyRule {
    Any,
    Lowercase,
    LowercaseUuid,
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RestrictedAudience {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<Vec<Restriction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<Vec<Restriction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sitekey: Option<Vec<Restriction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serverdomain: Option<Vec<Restriction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<Vec<Restriction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Vec<Restriction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Vec<Restriction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Restriction>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_difficulty: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_user_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_user_score: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_group_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<i64>>,
}

impl RestrictedAudience {
    /// True when no targeting is configured
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub(crate) fn parse(value: &Value, context: &ValidationContext) -> Result<Self, ValidationErrors> {
        let mut reader = ObjectReader::new(value, context)?;

        let audience = Self {
            lang: reader.optional_list("lang", |v, c| parse_restriction(v, c, KeyRule::Lowercase)),
            country: reader.optional_list("country", |v, c| parse_restriction(v, c, KeyRule::Lowercase)),
            sitekey: reader.optional_list("sitekey", |v, c| parse_restriction(v, c, KeyRule::LowercaseUuid)),
            serverdomain: reader.optional_list("serverdomain", |v, c| parse_restriction(v, c, KeyRule::Any)),
            browser: reader.optional_list("browser", |v, c| parse_restriction(v, c, KeyRule::OneOf(BROWSERS))),
            confidence: reader
                .optional_list("confidence", |v, c| parse_restriction(v, c, KeyRule::OneOf(CONFIDENCES))),
            reason: reader.optional_list("reason", |v, c| parse_restriction(v, c, KeyRule::Any)),
            roles: reader.optional_list("roles", |v, c| parse_restriction(v, c, KeyRule::Any)),
            min_difficulty: reader.optional("min_difficulty", |v, c| {
                let difficulty = as_i64(v, c)?;
                ValidationHelpers::validate_range(difficulty as f64, Some(0.0), Some(4.0), c)?;
                Ok(difficulty)
            }),
            min_user_score: reader.optional("min_user_score", as_unit_interval),
            max_user_score: reader.optional("max_user_score", as_unit_interval),
            launch_group_id: reader.optional("launch_group_id", |v, c| {
                let id = as_i64(v, c)?;
                ValidationHelpers::validate_non_negative(id as f64, c)?;
                Ok(id)
            }),
            interests: reader.optional("interests", |v, c| {
                let Value::Array(items) = v else {
                    return Err(ValidationError::shape(c.path.clone(), "Expected array of integers")
                        .with_input(v.clone()));
                };
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| as_i64(item, &c.child_index(i)))
                    .collect()
            }),
        };

        reader.finish()?;
        Ok(audience)
    }
}

fn parse_restriction(
    value: &Value,
    context: &ValidationContext,
    key_rule: KeyRule,
) -> Result<Restriction, ValidationErrors> {
    let Value::Object(object) = value else {
        return Err(ValidationError::shape(context.path.clone(), "Expected single-entry object")
            .with_input(value.clone())
            .into());
    };
    if object.len() != 1 {
        return Err(ValidationError::with_violations(
            ErrorKind::Shape,
            context.path.clone(),
            "only 1 element per list item is allowed",
            vec![ValidationError::create_violation(
                "single_entry",
                "exactly 1 key",
                format!("{} keys", object.len()),
            )],
        )
        .with_input(value.clone())
        .into());
    }

    let mut restriction = Restriction::new();
    for (key, entry) in object {
        let child = context.child(key.as_str());
        check_key(key, key_rule, &child)?;
        restriction.insert(key.clone(), parse_score(entry, &child)?);
    }
    Ok(restriction)
}

fn check_key(key: &str, key_rule: KeyRule, context: &ValidationContext) -> ValidationResult<()> {
    match key_rule {
        KeyRule::Any => Ok(()),
        KeyRule::Lowercase => ValidationHelpers::validate_lowercase(key, context),
        KeyRule::LowercaseUuid => {
            ValidationHelpers::validate_lowercase(key, context)?;
            ValidationHelpers::validate_uuid(key, context)
                .map(|_| ())
                .map_err(|e| ValidationError { message: "invalid sitekey".to_string(), ..e })
        }
        KeyRule::OneOf(allowed) => ValidationHelpers::validate_enum_value(key, allowed, "restriction key", context),
    }
}

fn parse_score(value: &Value, context: &ValidationContext) -> ValidationResult<AudienceScore> {
    let Some(score) = value.get("score") else {
        return Err(ValidationError::shape(context.path.child("score"), "Required field score is missing")
            .with_input(value.clone()));
    };
    let score = as_unit_interval(score, &context.child("score"))?;
    Ok(AudienceScore { score })
}

/// Validator for standalone RestrictedAudience documents
#[derive(Debug, Clone, Default)]
pub struct RestrictedAudienceValidator;

impl RestrictedAudienceValidator {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaValidator for RestrictedAudienceValidator {
    type Output = RestrictedAudience;

    fn validate_with_context(&self, input: &Value, context: &ValidationContext) -> Result<RestrictedAudience, ValidationErrors> {
        RestrictedAudience::parse(input, context)
    }
}
