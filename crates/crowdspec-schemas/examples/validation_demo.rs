//! Validation demonstration example
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use serde_json::json;
use crowdspec_schemas::{
    create_groundtruth_validator, create_manifest_validator, RequestType, SchemaValidator, ValidationConfig,
    ValidationContext,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Crowdspec Validation Demo ===\n");

    demo_manifest_validation()?;

    println!();

    demo_groundtruth_validation()?;

    Ok(())
}

fn demo_manifest_validation() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Manifest Validation Demo ---");

    let validator = create_manifest_validator();

    let area_select = json!({
        "job_mode": "batch",
        "request_type": "image_label_area_select",
        "requester_question": {"en": "select the cat"},
        "task_bid_price": 1.0,
        "oracle_stake": 0.05,
        "job_total_tasks": 10,
        "taskdata_uri": "https://example.com/taskdata.json"
    });

    println!("✅ Validating area select manifest without an answer set:");
    let validated = validator.validate(&area_select)?;
    println!(
        "   Valid! Injected answer set: {}",
        serde_json::to_string(&validated.requester_restricted_answer_set)?
    );

    let mut multiple_choice = area_select.clone();
    multiple_choice["request_type"] = json!("image_label_multiple_choice");
    multiple_choice["requester_restricted_answer_set"] = json!({"cat": {"en": "cat"}});
    multiple_choice["taskdata"] = json!([{
        "task_key": "407fdd93-687a-46bb-b578-89eb96b4109d",
        "datapoint_uri": "https://example.com/1.jpg"
    }]);

    println!("\n❌ Validating multiple choice manifest with two problems (fail fast):");
    if let Err(e) = validator.validate(&multiple_choice) {
        println!("   Error: {}", e);
    }

    println!("\n🔍 Same manifest, collecting every failure:");
    let context = ValidationContext::new(ValidationConfig::default().collect_all());
    if let Err(errors) = validator.validate_with_context(&multiple_choice, &context) {
        for error in errors.iter() {
            println!("   {} [{}]: {}", error.path, error.kind, error.message);
        }
    }

    Ok(())
}

fn demo_groundtruth_validation() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Groundtruth Validation Demo ---");

    let validator = create_groundtruth_validator(RequestType::ImageLabelBinary);
    let document = json!({
        "https://example.com/1.jpg": ["true", "false"],
        "https://example.com/2.jpg": ["maybe"]
    });

    match validator.validate_document(&document, &ValidationContext::default()) {
        Ok(entries) => println!("   {} entries valid", entries.len()),
        Err(e) => println!("   Error: {}", e),
    }

    Ok(())
}
