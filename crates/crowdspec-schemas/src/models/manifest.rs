//! Manifest and NestedManifest records
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crate::models::config::{InternalConfig, Webhook};
use crate::models::job::{AnswerSet, ExampleExtraFields, JobMode, LocaleMap, QuestionExample, RequestConfig, RequestType};
use crate::models::restricted_audience::RestrictedAudience;
use crate::models::taskdata::TaskData;
use crate::models::Presence;
use crate::validation::rules::{manifest_rules, nested_manifest_rules, ChallengeFields};
use crate::validation::shape::{
    as_answer_set, as_bool, as_i64, as_non_negative_f64, as_string, as_string_map, as_u64, as_url, as_uuid,
    incomplete, ObjectReader,
};
use crate::validation::{SchemaValidator, ValidationContext, ValidationErrors};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

/// Default for requester_max_repeats
pub const DEFAULT_MAX_REPEATS: u64 = 100;
/// Default for requester_min_repeats
pub const DEFAULT_MIN_REPEATS: u64 = 1;
/// Default for requester_accuracy_target and the trust floors
pub const DEFAULT_ACCURACY_TARGET: f64 = 0.1;

/// Top-level job description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    /// Generated when absent
    pub job_id: Uuid,
    /// Generated when absent
    pub job_api_key: Uuid,
    pub job_mode: JobMode,
    /// Absent only before the rule engine has run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_type: Option<RequestType>,
    pub job_total_tasks: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_challenge_manifests: Option<Vec<NestedManifest>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    pub only_sign_results: bool,
    pub public_results: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_restricted_answer_set: Option<AnswerSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_description: Option<String>,
    pub requester_max_repeats: u64,
    pub requester_min_repeats: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_question: Option<LocaleMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_question_example: Option<QuestionExample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_example_extra_fields: Option<ExampleExtraFields>,

    pub unsafe_content: bool,
    pub task_bid_price: f64,
    pub oracle_stake: f64,
    /// Unix seconds; 0 counts as unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<i64>,
    /// Unix seconds; 0 counts as unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<i64>,
    pub requester_accuracy_target: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_smart_bounty_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hmtoken_addr: Option<String>,
    pub minimum_trust_server: f64,
    pub minimum_trust_client: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_oracle_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reputation_oracle_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reputation_agent_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_pgp_public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ro_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_result_delivery_webhook: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online_result_delivery_webhook: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instant_result_delivery_webhook: Option<Url>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_config: Option<RequestConfig>,

    /// Inline taskdata, exclusive with `taskdata_uri`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taskdata: Option<Vec<TaskData>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taskdata_uri: Option<Url>,

    /// JSON-serialized inline groundtruth, exclusive with `groundtruth_uri`
    #[serde(skip_serializing_if = "Presence::is_absent")]
    pub groundtruth: Presence<String>,
    #[serde(skip_serializing_if = "Presence::is_absent")]
    pub groundtruth_uri: Presence<Url>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_config: Option<InternalConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confcalc_configuration_id: Option<String>,
    pub restricted_audience: RestrictedAudience,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<Webhook>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_uri: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_count: Option<u64>,

    pub is_verification: bool,
}

impl Manifest {
    /// Longest allowed distance between start_date and expiration_date
    pub fn max_job_duration() -> Duration {
        Duration::days(7)
    }

    /// Scheduling window start, when set
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_date
            .filter(|date| *date != 0)
            .and_then(|date| DateTime::from_timestamp(date, 0))
    }

    /// Scheduling window end, when set
    pub fn expiration_time(&self) -> Option<DateTime<Utc>> {
        self.expiration_date
            .filter(|date| *date != 0)
            .and_then(|date| DateTime::from_timestamp(date, 0))
    }

    /// Read every field and apply declared defaults; no cross-field checks
    pub fn shape(value: &Value, context: &ValidationContext) -> Result<Self, ValidationErrors> {
        let mut reader = ObjectReader::new(value, context)?;

        let job_id = reader.optional("job_id", as_uuid).unwrap_or_else(Uuid::new_v4);
        let job_api_key = reader.optional("job_api_key", as_uuid).unwrap_or_else(Uuid::new_v4);
        let job_mode = reader.required("job_mode", JobMode::parse);
        let request_type = reader.optional("request_type", RequestType::parse);
        let job_total_tasks = reader.required("job_total_tasks", as_u64);
        let multi_challenge_manifests = reader.optional_list("multi_challenge_manifests", NestedManifest::shape);
        let network = reader.optional("network", as_string);
        let only_sign_results = reader.optional("only_sign_results", as_bool).unwrap_or(false);
        let public_results = reader.optional("public_results", as_bool).unwrap_or(false);

        let requester_restricted_answer_set = reader.optional("requester_restricted_answer_set", as_answer_set);
        let requester_description = reader.optional("requester_description", as_string);
        let requester_max_repeats = reader
            .optional("requester_max_repeats", as_u64)
            .unwrap_or(DEFAULT_MAX_REPEATS);
        let requester_min_repeats = reader
            .optional("requester_min_repeats", as_u64)
            .unwrap_or(DEFAULT_MIN_REPEATS);
        let requester_question = reader.optional("requester_question", as_string_map);
        let requester_question_example = reader.optional("requester_question_example", QuestionExample::parse);
        let requester_example_extra_fields =
            reader.optional("requester_example_extra_fields", ExampleExtraFields::parse);

        let unsafe_content = reader.optional("unsafe_content", as_bool).unwrap_or(false);
        let task_bid_price = reader.required("task_bid_price", as_non_negative_f64);
        let oracle_stake = reader.required("oracle_stake", as_non_negative_f64);
        let expiration_date = reader.optional("expiration_date", as_i64);
        let start_date = reader.optional("start_date", as_i64);
        let requester_accuracy_target = reader
            .optional("requester_accuracy_target", as_non_negative_f64)
            .unwrap_or(DEFAULT_ACCURACY_TARGET);
        let manifest_smart_bounty_addr = reader.optional("manifest_smart_bounty_addr", as_string);
        let hmtoken_addr = reader.optional("hmtoken_addr", as_string);
        let minimum_trust_server = reader
            .optional("minimum_trust_server", as_non_negative_f64)
            .unwrap_or(DEFAULT_ACCURACY_TARGET);
        let minimum_trust_client = reader
            .optional("minimum_trust_client", as_non_negative_f64)
            .unwrap_or(DEFAULT_ACCURACY_TARGET);
        let recording_oracle_addr = reader.optional("recording_oracle_addr", as_string);
        let reputation_oracle_addr = reader.optional("reputation_oracle_addr", as_string);
        let reputation_agent_addr = reader.optional("reputation_agent_addr", as_string);
        let requester_pgp_public_key = reader.optional("requester_pgp_public_key", as_string);
        let ro_uri = reader.optional("ro_uri", as_string);
        let repo_uri = reader.optional("repo_uri", as_string);
        let batch_result_delivery_webhook = reader.optional("batch_result_delivery_webhook", as_url);
        let online_result_delivery_webhook = reader.optional("online_result_delivery_webhook", as_url);
        let instant_result_delivery_webhook = reader.optional("instant_result_delivery_webhook", as_url);

        let request_config = reader.optional_nested("request_config", RequestConfig::parse);
        let taskdata = reader.optional_list("taskdata", TaskData::from_value);
        let taskdata_uri = reader.optional("taskdata_uri", as_url);
        let groundtruth = reader.optional_presence("groundtruth", as_string);
        let groundtruth_uri = reader.optional_presence("groundtruth_uri", as_url);

        let internal_config = reader.optional_nested("internal_config", InternalConfig::parse);
        let confcalc_configuration_id = reader.optional("confcalc_configuration_id", as_string);
        let restricted_audience = reader
            .optional_nested("restricted_audience", RestrictedAudience::parse)
            .unwrap_or_default();
        let webhook = reader.optional_nested("webhook", Webhook::parse);
        let rejected_uri = reader.optional("rejected_uri", as_url);
        let rejected_count = reader.optional("rejected_count", as_u64);
        let is_verification = reader.optional("is_verification", as_bool).unwrap_or(false);

        reader.finish()?;

        let (Some(job_mode), Some(job_total_tasks), Some(task_bid_price), Some(oracle_stake)) =
            (job_mode, job_total_tasks, task_bid_price, oracle_stake)
        else {
            return Err(incomplete(context, "manifest"));
        };

        Ok(Self {
            job_id,
            job_api_key,
            job_mode,
            request_type,
            job_total_tasks,
            multi_challenge_manifests,
            network,
            only_sign_results,
            public_results,
            requester_restricted_answer_set,
            requester_description,
            requester_max_repeats,
            requester_min_repeats,
            requester_question,
            requester_question_example,
            requester_example_extra_fields,
            unsafe_content,
            task_bid_price,
            oracle_stake,
            expiration_date,
            start_date,
            requester_accuracy_target,
            manifest_smart_bounty_addr,
            hmtoken_addr,
            minimum_trust_server,
            minimum_trust_client,
            recording_oracle_addr,
            reputation_oracle_addr,
            reputation_agent_addr,
            requester_pgp_public_key,
            ro_uri,
            repo_uri,
            batch_result_delivery_webhook,
            online_result_delivery_webhook,
            instant_result_delivery_webhook,
            request_config,
            taskdata,
            taskdata_uri,
            groundtruth,
            groundtruth_uri,
            internal_config,
            confcalc_configuration_id,
            restricted_audience,
            webhook,
            rejected_uri,
            rejected_count,
            is_verification,
        })
    }
}

impl ChallengeFields for Manifest {
    fn request_type(&self) -> Option<RequestType> {
        self.request_type
    }

    fn request_config(&self) -> Option<&RequestConfig> {
        self.request_config.as_ref()
    }

    fn answer_set(&self) -> Option<&AnswerSet> {
        self.requester_restricted_answer_set.as_ref()
    }

    fn with_answer_set(self, answer_set: AnswerSet) -> Self {
        Self {
            requester_restricted_answer_set: Some(answer_set),
            ..self
        }
    }

    fn question_example(&self) -> Option<&QuestionExample> {
        self.requester_question_example.as_ref()
    }

    fn groundtruth(&self) -> Presence<&String> {
        self.groundtruth.as_ref()
    }

    fn groundtruth_uri(&self) -> Presence<&Url> {
        self.groundtruth_uri.as_ref()
    }
}

/// Sub-job inside a multi_challenge Manifest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedManifest {
    /// Generated when absent
    pub job_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_type: Option<RequestType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_restricted_answer_set: Option<AnswerSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_description: Option<String>,
    pub requester_max_repeats: u64,
    pub requester_min_repeats: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_question: Option<LocaleMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_question_example: Option<QuestionExample>,
    pub unsafe_content: bool,
    pub requester_accuracy_target: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_config: Option<RequestConfig>,
    #[serde(skip_serializing_if = "Presence::is_absent")]
    pub groundtruth: Presence<String>,
    #[serde(skip_serializing_if = "Presence::is_absent")]
    pub groundtruth_uri: Presence<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confcalc_configuration_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<Webhook>,
}

impl NestedManifest {
    /// Read every field and apply declared defaults; no cross-field checks
    pub fn shape(value: &Value, context: &ValidationContext) -> Result<Self, ValidationErrors> {
        let mut reader = ObjectReader::new(value, context)?;

        let nested = Self {
            job_id: reader.optional("job_id", as_uuid).unwrap_or_else(Uuid::new_v4),
            request_type: reader.optional("request_type", RequestType::parse),
            requester_restricted_answer_set: reader.optional("requester_restricted_answer_set", as_answer_set),
            requester_description: reader.optional("requester_description", as_string),
            requester_max_repeats: reader
                .optional("requester_max_repeats", as_u64)
                .unwrap_or(DEFAULT_MAX_REPEATS),
            requester_min_repeats: reader
                .optional("requester_min_repeats", as_u64)
                .unwrap_or(DEFAULT_MIN_REPEATS),
            requester_question: reader.optional("requester_question", as_string_map),
            requester_question_example: reader.optional("requester_question_example", QuestionExample::parse),
            unsafe_content: reader.optional("unsafe_content", as_bool).unwrap_or(false),
            requester_accuracy_target: reader
                .optional("requester_accuracy_target", as_non_negative_f64)
                .unwrap_or(DEFAULT_ACCURACY_TARGET),
            request_config: reader.optional_nested("request_config", RequestConfig::parse),
            groundtruth: reader.optional_presence("groundtruth", as_string),
            groundtruth_uri: reader.optional_presence("groundtruth_uri", as_url),
            confcalc_configuration_id: reader.optional("confcalc_configuration_id", as_string),
            webhook: reader.optional_nested("webhook", Webhook::parse),
        };

        reader.finish()?;
        Ok(nested)
    }
}

impl ChallengeFields for NestedManifest {
    fn request_type(&self) -> Option<RequestType> {
        self.request_type
    }

    fn request_config(&self) -> Option<&RequestConfig> {
        self.request_config.as_ref()
    }

    fn answer_set(&self) -> Option<&AnswerSet> {
        self.requester_restricted_answer_set.as_ref()
    }

    fn with_answer_set(self, answer_set: AnswerSet) -> Self {
        Self {
            requester_restricted_answer_set: Some(answer_set),
            ..self
        }
    }

    fn question_example(&self) -> Option<&QuestionExample> {
        self.requester_question_example.as_ref()
    }

    fn groundtruth(&self) -> Presence<&String> {
        self.groundtruth.as_ref()
    }

    fn groundtruth_uri(&self) -> Presence<&Url> {
        self.groundtruth_uri.as_ref()
    }
}

/// Validator producing a fully validated [`Manifest`]
#[derive(Debug, Clone, Default)]
pub struct ManifestValidator;

impl ManifestValidator {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaValidator for ManifestValidator {
    type Output = Manifest;

    fn validate_with_context(&self, input: &Value, context: &ValidationContext) -> Result<Manifest, ValidationErrors> {
        let manifest = Manifest::shape(input, context)?;
        manifest_rules().run(manifest, context)
    }
}

/// Validator producing a fully validated [`NestedManifest`]
#[derive(Debug, Clone, Default)]
pub struct NestedManifestValidator;

impl NestedManifestValidator {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaValidator for NestedManifestValidator {
    type Output = NestedManifest;

    fn validate_with_context(
        &self,
        input: &Value,
        context: &ValidationContext,
    ) -> Result<NestedManifest, ValidationErrors> {
        let nested = NestedManifest::shape(input, context)?;
        nested_manifest_rules().run(nested, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ErrorKind;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "job_mode": "batch",
            "request_type": "image_label_binary",
            "task_bid_price": 1.0,
            "oracle_stake": 0.05,
            "job_total_tasks": 10,
            "taskdata_uri": "https://example.com/taskdata.json"
        })
    }

    #[test]
    fn test_shape_applies_defaults() {
        let manifest = Manifest::shape(&minimal(), &ValidationContext::default()).unwrap();
        assert_eq!(manifest.requester_max_repeats, 100);
        assert_eq!(manifest.requester_min_repeats, 1);
        assert!(!manifest.unsafe_content);
        assert_eq!(manifest.requester_accuracy_target, 0.1);
        assert_eq!(manifest.minimum_trust_client, 0.1);
        assert!(manifest.restricted_audience.is_empty());
        assert!(manifest.groundtruth.is_absent());
        assert_ne!(manifest.job_id, manifest.job_api_key);
    }

    #[test]
    fn test_shape_collects_every_field_error() {
        let mut value = minimal();
        value["job_mode"] = json!("weekly");
        value["task_bid_price"] = json!(-1);
        value.as_object_mut().unwrap().remove("job_total_tasks");

        let errors = Manifest::shape(&value, &ValidationContext::default()).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.is_shape_only());
    }

    #[test]
    fn test_invalid_request_type_is_a_shape_error() {
        let mut value = minimal();
        value["request_type"] = json!("image_label_everything");
        let errors = ManifestValidator::new().validate(&value).unwrap_err();
        assert_eq!(errors.errors[0].kind, ErrorKind::Shape);
        assert_eq!(errors.errors[0].path.to_string(), "$.request_type");
    }

    #[test]
    fn test_missing_request_type_is_a_distinct_error() {
        let mut value = minimal();
        value.as_object_mut().unwrap().remove("request_type");
        let errors = ManifestValidator::new().validate(&value).unwrap_err();
        assert_eq!(errors.errors[0].kind, ErrorKind::MissingDiscriminant);
    }

    #[test]
    fn test_generated_ids_are_kept_when_supplied() {
        let mut value = minimal();
        value["job_id"] = json!("c26c2e6a-41ab-4218-b39e-6314b760c45c");
        let manifest = ManifestValidator::new().validate(&value).unwrap();
        assert_eq!(manifest.job_id.to_string(), "c26c2e6a-41ab-4218-b39e-6314b760c45c");
    }

    #[test]
    fn test_scheduling_times() {
        let mut value = minimal();
        value["start_date"] = json!(1_700_000_000);
        value["expiration_date"] = json!(1_700_086_400);
        let manifest = ManifestValidator::new().validate(&value).unwrap();
        let span = manifest.expiration_time().unwrap() - manifest.start_time().unwrap();
        assert_eq!(span, Duration::days(1));
    }

    #[test]
    fn test_nested_manifest_shape() {
        let nested = NestedManifest::shape(
            &json!({"request_type": "image_label_binary", "requester_question": {"en": "cat?"}}),
            &ValidationContext::default(),
        )
        .unwrap();
        assert_eq!(nested.requester_max_repeats, 100);
        assert_eq!(nested.request_type, Some(RequestType::ImageLabelBinary));
    }
}
