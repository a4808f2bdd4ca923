//! Unit tests for the Manifest cross-field rules
//!
//! Each group exercises one rule of the Manifest rule list with passing and
//! failing documents and checks the reported path, kind and message.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use crowdspec_schemas::models::AnswerSet;
use crowdspec_schemas::{
    create_manifest_validator, ErrorKind, RequestType, SchemaValidator, ValidationConfig, ValidationContext,
};

/// Helper to create a minimal valid Manifest
fn minimal_manifest(request_type: &str) -> Value {
    json!({
        "job_mode": "batch",
        "request_type": request_type,
        "requester_question": {"en": "How much money are we to make"},
        "requester_question_example": "https://example.com/what.jpg",
        "unsafe_content": false,
        "task_bid_price": 1,
        "oracle_stake": 0.05,
        "expiration_date": 0,
        "minimum_trust_server": 0.1,
        "minimum_trust_client": 0.1,
        "requester_accuracy_target": 0.1,
        "recording_oracle_addr": "0x0",
        "reputation_oracle_addr": "0x0",
        "reputation_agent_addr": "0x0",
        "job_total_tasks": 5,
        "taskdata_uri": "https://domain.com/taskdata.json"
    })
}

fn answer_set(options: usize) -> Value {
    let map: serde_json::Map<String, Value> = (0..options)
        .map(|i| (i.to_string(), json!({"en": format!("option {}", i)})))
        .collect();
    Value::Object(map)
}

fn nested(request_type: &str) -> Value {
    json!({
        "request_type": request_type,
        "requester_question": {"en": "nested question"},
        "requester_restricted_answer_set": {"0": {"en": "yes"}, "1": {"en": "no"}}
    })
}

#[cfg(test)]
mod scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_binary_manifest_gets_defaults() {
        let manifest = create_manifest_validator()
            .validate(&minimal_manifest("image_label_binary"))
            .unwrap();
        assert_eq!(manifest.requester_max_repeats, 100);
        assert_eq!(manifest.requester_min_repeats, 1);
        assert!(!manifest.unsafe_content);
        assert!(!manifest.is_verification);
        assert_eq!(manifest.request_type, Some(RequestType::ImageLabelBinary));
    }

    #[test]
    fn test_area_select_gets_default_answer_set() {
        let manifest = create_manifest_validator()
            .validate(&minimal_manifest("image_label_area_select"))
            .unwrap();
        let mut expected = AnswerSet::new();
        expected.insert("label".to_string(), Default::default());
        assert_eq!(manifest.requester_restricted_answer_set, Some(expected));
    }

    #[test]
    fn test_multi_challenge_with_empty_list_fails() {
        let mut value = minimal_manifest("multi_challenge");
        value["multi_challenge_manifests"] = json!([]);

        let errors = create_manifest_validator().validate(&value).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors[0].kind, ErrorKind::Rule);
        assert_eq!(errors.errors[0].path.to_string(), "$.multi_challenge_manifests");
        assert_eq!(errors.errors[0].message, "multi_challenge requires multi_challenge_manifests.");
    }
}

#[cfg(test)]
mod request_type_rule {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_request_type_stops_every_rule() {
        let mut value = minimal_manifest("image_label_binary");
        value.as_object_mut().unwrap().remove("request_type");

        let context = ValidationContext::new(ValidationConfig::default().collect_all());
        let errors = create_manifest_validator()
            .validate_with_context(&value, &context)
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors[0].kind, ErrorKind::MissingDiscriminant);
        assert_eq!(errors.errors[0].path.to_string(), "$.request_type");
    }

    #[test]
    fn test_multi_challenge_without_list_fails() {
        let errors = create_manifest_validator()
            .validate(&minimal_manifest("multi_challenge"))
            .unwrap_err();
        assert_eq!(errors.errors[0].path.to_string(), "$.multi_challenge_manifests");
    }

    #[test]
    fn test_choice_bounds_must_be_ordered() {
        let mut value = minimal_manifest("image_label_multiple_choice");
        value["requester_restricted_answer_set"] = answer_set(3);
        value["request_config"] = json!({"multiple_choice_min_choices": 3, "multiple_choice_max_choices": 2});

        let errors = create_manifest_validator().validate(&value).unwrap_err();
        assert_eq!(
            errors.errors[0].path.to_string(),
            "$.request_config.multiple_choice_min_choices"
        );
        assert!(errors.to_string().contains("cannot be greater than"));

        value["request_config"] = json!({"multiple_choice_min_choices": 1, "multiple_choice_max_choices": 2});
        assert!(create_manifest_validator().validate(&value).is_ok());
    }

    #[test]
    fn test_choice_bounds_ignored_for_other_types() {
        let mut value = minimal_manifest("image_label_binary");
        value["request_config"] = json!({"multiple_choice_min_choices": 3, "multiple_choice_max_choices": 2});
        assert!(create_manifest_validator().validate(&value).is_ok());
    }
}

#[cfg(test)]
mod multi_challenge {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nested_manifests_run_their_own_rules() {
        let mut value = minimal_manifest("multi_challenge");
        value["multi_challenge_manifests"] = json!([
            nested("image_label_binary"),
            {"request_type": "image_label_area_select", "requester_question": {"en": "where"}}
        ]);

        let manifest = create_manifest_validator().validate(&value).unwrap();
        let nested = manifest.multi_challenge_manifests.unwrap();
        assert_eq!(nested.len(), 2);
        assert!(nested[1].requester_restricted_answer_set.as_ref().unwrap().contains_key("label"));
    }

    #[test]
    fn test_nested_multi_challenge_is_rejected() {
        let mut value = minimal_manifest("multi_challenge");
        value["multi_challenge_manifests"] = json!([nested("image_label_binary"), nested("multi_challenge")]);

        let errors = create_manifest_validator().validate(&value).unwrap_err();
        assert_eq!(errors.errors[0].path.to_string(), "$.multi_challenge_manifests[1].request_type");
        assert_eq!(errors.errors[0].message, "multi_challenge request is not allowed here.");
    }

    #[test]
    fn test_nested_shape_errors_carry_index() {
        let mut value = minimal_manifest("multi_challenge");
        value["multi_challenge_manifests"] = json!([{"request_type": "image_label_binary", "requester_max_repeats": "many"}]);

        let errors = create_manifest_validator().validate(&value).unwrap_err();
        assert!(errors.is_shape_only());
        assert_eq!(
            errors.errors[0].path.to_string(),
            "$.multi_challenge_manifests[0].requester_max_repeats"
        );
    }

    #[test]
    fn test_nested_groundtruth_exclusivity() {
        let mut sub_job = nested("image_label_binary");
        sub_job["groundtruth"] = json!("{}");
        sub_job["groundtruth_uri"] = json!("https://domain.com/groundtruth.json");
        let mut value = minimal_manifest("multi_challenge");
        value["multi_challenge_manifests"] = json!([sub_job]);

        let errors = create_manifest_validator().validate(&value).unwrap_err();
        assert_eq!(errors.errors[0].path.to_string(), "$.multi_challenge_manifests[0].groundtruth");
    }
}

#[cfg(test)]
mod answer_set_rule {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_multiple_choice_bounds() {
        let validator = create_manifest_validator();
        for options in [0usize, 1, 5, 6] {
            let mut value = minimal_manifest("image_label_multiple_choice");
            value["requester_restricted_answer_set"] = answer_set(options);
            let errors = validator.validate(&value).unwrap_err();
            assert_eq!(errors.errors[0].rule_name(), Some("requester_restricted_answer_set"));
        }
        for options in 2..=4usize {
            let mut value = minimal_manifest("image_label_multiple_choice");
            value["requester_restricted_answer_set"] = answer_set(options);
            assert!(validator.validate(&value).is_ok(), "{} options should pass", options);
        }
    }

    #[test]
    fn test_multiple_choice_messages() {
        let mut value = minimal_manifest("image_label_multiple_choice");
        value["requester_restricted_answer_set"] = answer_set(1);
        let errors = create_manifest_validator().validate(&value).unwrap_err();
        assert_eq!(
            errors.errors[0].message,
            "image_label_multiple_choice needs at least 2+ options in requester_restricted_answer_set"
        );

        value["requester_restricted_answer_set"] = answer_set(5);
        let errors = create_manifest_validator().validate(&value).unwrap_err();
        assert_eq!(
            errors.errors[0].message,
            "image_label_multiple_choice can not handle more than 4 options requester_restricted_answer_set"
        );
    }

    #[test]
    fn test_area_select_keeps_supplied_answer_set() {
        let mut value = minimal_manifest("image_label_area_select");
        value["requester_restricted_answer_set"] = json!({"cat": {"en": "cat"}});
        let manifest = create_manifest_validator().validate(&value).unwrap();
        let answer_set = manifest.requester_restricted_answer_set.unwrap();
        assert_eq!(answer_set.len(), 1);
        assert!(answer_set.contains_key("cat"));

        value["requester_restricted_answer_set"] = json!({});
        let manifest = create_manifest_validator().validate(&value).unwrap();
        assert!(manifest.requester_restricted_answer_set.unwrap().contains_key("label"));
    }

    #[test]
    fn test_answer_set_values_must_be_locale_maps() {
        let mut value = minimal_manifest("image_label_binary");
        value["requester_restricted_answer_set"] = json!({"0": ["yes"]});
        let errors = create_manifest_validator().validate(&value).unwrap_err();
        assert_eq!(errors.errors[0].kind, ErrorKind::Shape);
        assert_eq!(errors.errors[0].path.to_string(), "$.requester_restricted_answer_set.0");
    }
}

#[cfg(test)]
mod question_example_rule {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lists_allowed_for_select_types() {
        for request_type in ["image_label_binary", "image_label_area_select"] {
            let mut value = minimal_manifest(request_type);
            value["requester_question_example"] =
                json!(["https://example.com/a.jpg", "https://example.com/b.jpg"]);
            assert!(create_manifest_validator().validate(&value).is_ok(), "{}", request_type);
        }
    }

    #[test]
    fn test_lists_rejected_for_other_types() {
        let mut value = minimal_manifest("text_free_entry");
        value["requester_question_example"] = json!(["https://example.com/a.jpg"]);
        let errors = create_manifest_validator().validate(&value).unwrap_err();
        assert_eq!(errors.errors[0].message, "Lists are not allowed in this challenge type");
        assert_eq!(errors.errors[0].path.to_string(), "$.requester_question_example");
    }

    #[test]
    fn test_invalid_example_url_is_a_shape_error() {
        let mut value = minimal_manifest("image_label_binary");
        value["requester_question_example"] = json!(["https://example.com/a.jpg", "not a url"]);
        let errors = create_manifest_validator().validate(&value).unwrap_err();
        assert_eq!(errors.errors[0].path.to_string(), "$.requester_question_example[1]");
    }
}

#[cfg(test)]
mod groundtruth_exclusivity {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_both_values_fail() {
        let mut value = minimal_manifest("image_label_binary");
        value["groundtruth"] = json!("{\"https://domain.com/1.jpg\": [\"true\"]}");
        value["groundtruth_uri"] = json!("https://domain.com/groundtruth.json");
        let errors = create_manifest_validator().validate(&value).unwrap_err();
        assert_eq!(errors.errors[0].message, "Specify only groundtruth_uri or groundtruth, not both.");
    }

    #[test]
    fn test_either_alone_passes() {
        let mut value = minimal_manifest("image_label_binary");
        value["groundtruth_uri"] = json!("https://domain.com/groundtruth.json");
        assert!(create_manifest_validator().validate(&value).is_ok());

        let mut value = minimal_manifest("image_label_binary");
        value["groundtruth"] = json!("{}");
        assert!(create_manifest_validator().validate(&value).is_ok());
    }

    #[test]
    fn test_null_key_counts_as_present_by_default() {
        let mut value = minimal_manifest("image_label_binary");
        value["groundtruth"] = Value::Null;
        value["groundtruth_uri"] = json!("https://domain.com/groundtruth.json");

        assert!(create_manifest_validator().validate(&value).is_err());

        let lenient = ValidationContext::new(ValidationConfig::default().with_key_presence_exclusivity(false));
        let manifest = create_manifest_validator()
            .validate_with_context(&value, &lenient)
            .unwrap();
        assert!(manifest.groundtruth.is_present());
        assert!(!manifest.groundtruth.is_set());
    }
}

#[cfg(test)]
mod taskdata_exclusivity {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry() -> Value {
        json!({
            "task_key": "407fdd93-687a-46bb-b578-89eb96b4109d",
            "datapoint_uri": "https://domain.com/file1.jpg",
            "datapoint_hash": "f4acbe8562907183a484498ba901bfe5c5503aaa"
        })
    }

    #[test]
    fn test_inline_taskdata_alone_passes() {
        let mut value = minimal_manifest("image_label_binary");
        value.as_object_mut().unwrap().remove("taskdata_uri");
        value["taskdata"] = json!([entry()]);
        let manifest = create_manifest_validator().validate(&value).unwrap();
        assert_eq!(manifest.taskdata.unwrap().len(), 1);
    }

    #[test]
    fn test_both_sources_fail() {
        let mut value = minimal_manifest("image_label_binary");
        value["taskdata"] = json!([entry()]);
        let errors = create_manifest_validator().validate(&value).unwrap_err();
        assert_eq!(errors.errors[0].message, "Specify only one of taskdata or taskdata_uri");
    }

    #[test]
    fn test_empty_inline_taskdata_with_uri_passes() {
        let mut value = minimal_manifest("image_label_binary");
        value["taskdata"] = json!([]);
        assert!(create_manifest_validator().validate(&value).is_ok());
    }

    #[test]
    fn test_no_source_fails() {
        let mut value = minimal_manifest("image_label_binary");
        value.as_object_mut().unwrap().remove("taskdata_uri");
        let errors = create_manifest_validator().validate(&value).unwrap_err();
        assert_eq!(errors.errors[0].message, "No taskdata or taskdata_uri found in manifest");

        value["taskdata"] = json!([]);
        assert!(create_manifest_validator().validate(&value).is_err());
    }

    #[test]
    fn test_inline_entry_errors_carry_index() {
        let mut value = minimal_manifest("image_label_binary");
        value.as_object_mut().unwrap().remove("taskdata_uri");
        value["taskdata"] = json!([entry(), {"task_key": "407fdd93-687a-46bb-b578-89eb96b4109d"}]);
        let errors = create_manifest_validator().validate(&value).unwrap_err();
        assert_eq!(errors.errors[0].path.to_string(), "$.taskdata[1].datapoint_uri");
        assert_eq!(errors.errors[0].message, "datapoint_uri is missing.");
    }
}

#[cfg(test)]
mod min_repeats_floor {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_multiple_choice_raises_min_repeats() {
        let mut value = minimal_manifest("image_label_multiple_choice");
        value["requester_restricted_answer_set"] = answer_set(2);
        value["requester_min_repeats"] = json!(2);
        let manifest = create_manifest_validator().validate(&value).unwrap();
        assert_eq!(manifest.requester_min_repeats, 4);

        value["requester_min_repeats"] = json!(9);
        let manifest = create_manifest_validator().validate(&value).unwrap();
        assert_eq!(manifest.requester_min_repeats, 9);
    }

    #[test]
    fn test_other_types_keep_min_repeats() {
        let mut value = minimal_manifest("image_label_binary");
        value["requester_min_repeats"] = json!(2);
        let manifest = create_manifest_validator().validate(&value).unwrap();
        assert_eq!(manifest.requester_min_repeats, 2);
    }

    #[test]
    fn test_whole_float_counts_are_integers() {
        let mut value = minimal_manifest("image_label_binary");
        value["requester_min_repeats"] = json!(2.0);
        value["job_total_tasks"] = json!(10.0);
        let manifest = create_manifest_validator().validate(&value).unwrap();
        assert_eq!(manifest.requester_min_repeats, 2);
        assert_eq!(manifest.job_total_tasks, 10);

        value["job_total_tasks"] = json!(10.5);
        let errors = create_manifest_validator().validate(&value).unwrap_err();
        assert_eq!(errors.errors[0].path.to_string(), "$.job_total_tasks");
        assert_eq!(errors.errors[0].kind, ErrorKind::Shape);
    }
}

#[cfg(test)]
mod scheduling_window {
    use super::*;
    use pretty_assertions::assert_eq;

    const START: i64 = 1_700_000_000;
    const DAY: i64 = 86_400;

    fn with_dates(start: Option<i64>, expiration: Option<i64>) -> Value {
        let mut value = minimal_manifest("image_label_binary");
        let object = value.as_object_mut().unwrap();
        object.remove("expiration_date");
        if let Some(start) = start {
            object.insert("start_date".into(), json!(start));
        }
        if let Some(expiration) = expiration {
            object.insert("expiration_date".into(), json!(expiration));
        }
        value
    }

    #[test]
    fn test_no_dates_pass() {
        assert!(create_manifest_validator().validate(&with_dates(None, None)).is_ok());
        assert!(create_manifest_validator().validate(&with_dates(None, Some(0))).is_ok());
    }

    #[test]
    fn test_one_date_fails() {
        for value in [with_dates(Some(START), None), with_dates(None, Some(START))] {
            let errors = create_manifest_validator().validate(&value).unwrap_err();
            assert_eq!(errors.errors[0].message, "You must specify both start_date and expiration_date");
        }
    }

    #[test]
    fn test_dates_must_be_ordered() {
        let errors = create_manifest_validator()
            .validate(&with_dates(Some(START + DAY), Some(START)))
            .unwrap_err();
        assert_eq!(errors.errors[0].message, "start_date must be before expiration_date");
        assert!(create_manifest_validator().validate(&with_dates(Some(START), Some(START))).is_err());
    }

    #[test]
    fn test_window_is_at_most_seven_days() {
        assert!(create_manifest_validator()
            .validate(&with_dates(Some(START), Some(START + 7 * DAY)))
            .is_ok());
        let errors = create_manifest_validator()
            .validate(&with_dates(Some(START), Some(START + 7 * DAY + 1)))
            .unwrap_err();
        assert_eq!(errors.errors[0].message, "Max job duration is 7 days.");
    }

    #[test]
    fn test_extreme_start_date_is_too_long_not_a_panic() {
        let errors = create_manifest_validator()
            .validate(&with_dates(Some(i64::MIN), Some(START)))
            .unwrap_err();
        assert_eq!(errors.errors[0].message, "Max job duration is 7 days.");
        assert_eq!(errors.errors[0].path.to_string(), "$.expiration_date");
    }
}

#[cfg(test)]
mod failure_modes {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doubly_broken() -> Value {
        let mut value = minimal_manifest("image_label_multiple_choice");
        value["requester_restricted_answer_set"] = answer_set(1);
        value["taskdata"] = json!([{
            "task_key": "407fdd93-687a-46bb-b578-89eb96b4109d",
            "datapoint_uri": "https://domain.com/file1.jpg"
        }]);
        value
    }

    #[test]
    fn test_fail_fast_reports_first_rule() {
        let errors = create_manifest_validator().validate(&doubly_broken()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors[0].rule_name(), Some("requester_restricted_answer_set"));
    }

    #[test]
    fn test_collect_all_reports_every_rule() {
        let errors = create_manifest_validator().collect_errors(&doubly_broken());
        let rules: Vec<_> = errors.iter().filter_map(|e| e.rule_name()).collect();
        assert_eq!(rules, vec!["requester_restricted_answer_set", "taskdata_exclusivity"]);
    }

    #[test]
    fn test_shape_errors_are_reported_together() {
        let mut value = minimal_manifest("image_label_binary");
        value["job_mode"] = json!("weekly");
        value["oracle_stake"] = json!("0.05");
        value["requester_accuracy_target"] = json!(-1);
        let errors = create_manifest_validator().validate(&value).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.is_shape_only());
    }

    #[test]
    fn test_strict_mode_rejects_unknown_fields() {
        let mut value = minimal_manifest("image_label_binary");
        value["favourite_colour"] = json!("blue");
        assert!(create_manifest_validator().validate(&value).is_ok());

        let errors = create_manifest_validator().validate_strict(&value).unwrap_err();
        assert_eq!(errors.errors[0].path.to_string(), "$.favourite_colour");
    }

    #[test]
    fn test_errors_serialize_with_segment_paths() {
        let mut value = minimal_manifest("multi_challenge");
        value["multi_challenge_manifests"] = json!([nested("multi_challenge")]);
        let errors = create_manifest_validator().validate(&value).unwrap_err();
        let rendered = serde_json::to_value(&errors.errors[0]).unwrap();
        assert_eq!(rendered["path"], json!(["multi_challenge_manifests", 0, "request_type"]));
        assert_eq!(rendered["kind"], json!("rule"));
    }
}

#[cfg(test)]
mod round_trip {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validated_manifest_revalidates_unchanged() {
        let mut value = minimal_manifest("multi_challenge");
        value["multi_challenge_manifests"] = json!([
            nested("image_label_binary"),
            {"request_type": "image_label_area_select", "requester_question": {"en": "where"}}
        ]);
        value["groundtruth"] = Value::Null;
        value["restricted_audience"] = json!({"lang": [{"en-us": {"score": 0.9}}], "min_difficulty": 2});
        value["webhook"] = json!({
            "webhook_id": "c26c2e6a-41ab-4218-b39e-6314b760c45c",
            "job_completed": ["http://servicename:4000/api/webhook"]
        });
        value["internal_config"] = json!({"exchange": {"a": 1, "b": "c"}, "mitl": {"n": {"x": 1.5}}});

        let validator = create_manifest_validator();
        let first = validator.validate(&value).unwrap();
        let serialized = serde_json::to_value(&first).unwrap();
        let second = validator.validate(&serialized).unwrap();
        assert_eq!(first, second);
        assert_eq!(serialized["groundtruth"], Value::Null);
    }
}
