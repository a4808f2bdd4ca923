//! Property-based tests for Manifest validation
//!
//! These tests verify that the rule engine behaves correctly
//! across a wide range of generated documents.

use proptest::prelude::*;
use serde_json::{json, Value};
use crowdspec_schemas::{
    create_manifest_validator, create_taskdata_validator, ErrorKind, SchemaValidator, ValidationConfig,
    ValidationContext,
};

/// Strategy for generating random JSON values with controlled complexity
fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 ]{0,50}".prop_map(Value::String),
    ];

    leaf.prop_recursive(
        3,  // max depth
        10, // max size
        5,  // items per collection
        |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
                proptest::collection::hash_map(
                    "[a-zA-Z_][a-zA-Z0-9_]{0,20}",
                    inner,
                    0..5
                ).prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        },
    )
}

/// Request types that need no extra fields to pass the rules
fn simple_request_type_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("image_label_binary"),
        Just("image_label_area_select"),
        Just("image_label_area_adjust"),
        Just("text_free_entry"),
        Just("text_label_multiple_span_select"),
        Just("image_label_text"),
    ]
}

fn base_manifest(request_type: &str) -> Value {
    json!({
        "job_mode": "batch",
        "request_type": request_type,
        "requester_question": {"en": "what is in the picture?"},
        "task_bid_price": 1,
        "oracle_stake": 0.05,
        "job_total_tasks": 5,
        "taskdata_uri": "https://domain.com/taskdata.json"
    })
}

fn answer_set(options: usize) -> Value {
    let map: serde_json::Map<String, Value> = (0..options)
        .map(|i| (format!("option_{}", i), json!({"en": format!("option {}", i)})))
        .collect();
    Value::Object(map)
}

/// Strategy for generating manifests that pass every rule
fn valid_manifest_strategy() -> impl Strategy<Value = Value> {
    (
        simple_request_type_strategy(),
        1u64..20,
        0u64..200,
        proptest::option::of("[a-z ]{1,40}"),
        any::<bool>(),
    )
        .prop_map(|(request_type, min_repeats, max_repeats, description, unsafe_content)| {
            let mut manifest = base_manifest(request_type);
            manifest["requester_min_repeats"] = json!(min_repeats);
            manifest["requester_max_repeats"] = json!(max_repeats);
            manifest["unsafe_content"] = json!(unsafe_content);
            if let Some(description) = description {
                manifest["requester_description"] = json!(description);
            }
            manifest
        })
}

fn taskdata_entry(i: usize) -> Value {
    json!({
        "task_key": "407fdd93-687a-46bb-b578-89eb96b4109d",
        "datapoint_uri": format!("https://domain.com/file{}.jpg", i)
    })
}

proptest! {
    /// Property: Validators should never panic on any JSON input
    #[test]
    fn prop_validators_never_panic(
        input in json_value_strategy()
    ) {
        let _ = create_manifest_validator().validate(&input);
        let _ = create_manifest_validator().validate_strict(&input);
        let _ = create_manifest_validator().collect_errors(&input);
        let _ = create_taskdata_validator().validate(&input);
    }

    /// Property: Strict acceptance implies permissive acceptance
    #[test]
    fn prop_strict_is_stricter(
        mut manifest in valid_manifest_strategy(),
        extra in proptest::option::of(("[a-z]{3,12}_extra", json_value_strategy())),
    ) {
        if let Some((key, value)) = extra {
            manifest[key] = value;
        }
        let validator = create_manifest_validator();
        if validator.validate_strict(&manifest).is_ok() {
            prop_assert!(validator.validate(&manifest).is_ok());
        }
    }

    /// Property: Validating a validated manifest returns it unchanged
    #[test]
    fn prop_validation_is_idempotent(
        manifest in valid_manifest_strategy()
    ) {
        let validator = create_manifest_validator();
        let first = validator.validate(&manifest).unwrap();
        let second = validator.validate(&serde_json::to_value(&first).unwrap()).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Property: Validation is deterministic apart from generated ids
    #[test]
    fn prop_validation_deterministic(
        manifest in valid_manifest_strategy()
    ) {
        let mut manifest = manifest;
        manifest["job_id"] = json!("c26c2e6a-41ab-4218-b39e-6314b760c45c");
        manifest["job_api_key"] = json!("9d8c2e6a-41ab-4218-b39e-6314b760c45c");
        let validator = create_manifest_validator();
        prop_assert_eq!(validator.validate(&manifest).unwrap(), validator.validate(&manifest).unwrap());
    }

    /// Property: exactly one taskdata source is accepted
    #[test]
    fn prop_taskdata_sources_are_exclusive(
        inline_entries in proptest::option::of(0usize..4),
        with_uri in any::<bool>(),
    ) {
        let mut manifest = base_manifest("image_label_binary");
        let object = manifest.as_object_mut().unwrap();
        if !with_uri {
            object.remove("taskdata_uri");
        }
        if let Some(count) = inline_entries {
            object.insert("taskdata".into(), Value::Array((0..count).map(taskdata_entry).collect()));
        }

        let has_inline = inline_entries.is_some_and(|count| count > 0);
        let result = create_manifest_validator().validate(&manifest);
        prop_assert_eq!(result.is_ok(), has_inline != with_uri);
        if let Err(errors) = result {
            prop_assert_eq!(errors.errors[0].rule_name(), Some("taskdata_exclusivity"));
        }
    }

    /// Property: multiple choice accepts 2 to 4 options and floors min repeats at 4
    #[test]
    fn prop_multiple_choice_cardinality(
        options in 0usize..7,
        min_repeats in 0u64..12,
    ) {
        let mut manifest = base_manifest("image_label_multiple_choice");
        manifest["requester_restricted_answer_set"] = answer_set(options);
        manifest["requester_min_repeats"] = json!(min_repeats);

        match create_manifest_validator().validate(&manifest) {
            Ok(validated) => {
                prop_assert!((2..=4).contains(&options));
                prop_assert_eq!(validated.requester_min_repeats, min_repeats.max(4));
            }
            Err(errors) => {
                prop_assert!(!(2..=4).contains(&options));
                prop_assert_eq!(errors.errors[0].rule_name(), Some("requester_restricted_answer_set"));
            }
        }
    }

    /// Property: area select always ends up with a non-empty answer set
    #[test]
    fn prop_area_select_answer_set_is_never_empty(
        options in proptest::option::of(0usize..4)
    ) {
        let mut manifest = base_manifest("image_label_area_select");
        if let Some(options) = options {
            manifest["requester_restricted_answer_set"] = answer_set(options);
        }

        let validated = create_manifest_validator().validate(&manifest).unwrap();
        let answer_set = validated.requester_restricted_answer_set.unwrap();
        match options {
            Some(options) if options > 0 => prop_assert_eq!(answer_set.len(), options),
            _ => prop_assert!(answer_set.contains_key("label")),
        }
    }

    /// Property: multi_challenge passes exactly when it has sub-jobs
    #[test]
    fn prop_multi_challenge_needs_sub_jobs(
        sub_jobs in proptest::option::of(proptest::collection::vec(simple_request_type_strategy(), 0..4))
    ) {
        let mut manifest = base_manifest("multi_challenge");
        if let Some(sub_jobs) = &sub_jobs {
            let nested: Vec<Value> = sub_jobs
                .iter()
                .map(|request_type| json!({"request_type": request_type}))
                .collect();
            manifest["multi_challenge_manifests"] = Value::Array(nested);
        }

        let expected_ok = sub_jobs.as_ref().is_some_and(|jobs| !jobs.is_empty());
        let result = create_manifest_validator().validate(&manifest);
        prop_assert_eq!(result.is_ok(), expected_ok);
        if let Ok(validated) = result {
            prop_assert_eq!(validated.multi_challenge_manifests.unwrap().len(), sub_jobs.unwrap().len());
        }
    }

    /// Property: with a null key, the exclusivity outcome follows the configuration
    #[test]
    fn prop_groundtruth_null_presence(
        inline_null in any::<bool>(),
        key_presence in any::<bool>(),
    ) {
        let mut manifest = base_manifest("image_label_binary");
        if inline_null {
            manifest["groundtruth"] = Value::Null;
            manifest["groundtruth_uri"] = json!("https://domain.com/groundtruth.json");
        } else {
            manifest["groundtruth"] = json!("{}");
            manifest["groundtruth_uri"] = Value::Null;
        }

        let context = ValidationContext::new(
            ValidationConfig::default().with_key_presence_exclusivity(key_presence),
        );
        let result = create_manifest_validator().validate_with_context(&manifest, &context);
        prop_assert_eq!(result.is_err(), key_presence);
    }

    /// Property: removing request_type always yields a missing-discriminant error
    #[test]
    fn prop_missing_request_type(
        manifest in valid_manifest_strategy(),
        fail_fast in any::<bool>(),
    ) {
        let mut manifest = manifest;
        manifest.as_object_mut().unwrap().remove("request_type");
        let context = ValidationContext::new(ValidationConfig::default().with_fail_fast(fail_fast));
        let errors = create_manifest_validator()
            .validate_with_context(&manifest, &context)
            .unwrap_err();
        prop_assert_eq!(errors.len(), 1);
        prop_assert_eq!(errors.errors[0].kind, ErrorKind::MissingDiscriminant);
    }
}
