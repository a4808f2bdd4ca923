//! Crowdspec Schemas - data contracts for crowd-labeling jobs
//!
//! This crate defines and validates the documents exchanged between the
//! services of a labeling marketplace:
//! - **Manifest**: a job description, optionally holding nested sub-jobs
//! - **TaskData**: one unit of work (a datapoint plus metadata)
//! - **Groundtruth**: reference answers, shaped by the job's `request_type`
//! - **RestrictedAudience**: worker targeting filters
//! - **Preprocess**: the preprocessing pipeline applied to uploads
//! - **ViaDataManifest**: annotation results in the VIA layout
//!
//! ## Features
//!
//! - **Shape Validation**: typed fields with length, range, enum, URL and UUID checks
//! - **Cross-Field Rules**: an ordered rule engine with default injection
//! - **Validation Modes**: Permissive (default) and Strict
//! - **Batch Processing**: validate many manifests in one call
//! - **Detailed Error Reporting**: typed field paths, offending input and violated rule
//!
//! ## Quick Start
//!
//! ```rust
//! use crowdspec_schemas::{create_manifest_validator, SchemaValidator};
//! use serde_json::json;
//!
//! let validator = create_manifest_validator();
//!
//! let manifest = json!({
//!     "job_mode": "batch",
//!     "request_type": "image_label_area_select",
//!     "requester_question": {"en": "select the cat"},
//!     "task_bid_price": 1.0,
//!     "oracle_stake": 0.05,
//!     "job_total_tasks": 10,
//!     "taskdata_uri": "https://example.com/taskdata.json"
//! });
//!
//! match validator.validate(&manifest) {
//!     Ok(validated) => assert!(validated.requester_restricted_answer_set.is_some()),
//!     Err(e) => println!("Validation error: {}", e),
//! }
//! ```
//!
//! ## Manifest Rules
//!
//! Rules run in this order once every field passed its shape check:
//! 1. `request_type` must be present; `multi_challenge` needs sub-jobs and
//!    choice bounds must be ordered for multiple choice and area select
//! 2. every nested manifest passes the nested rule list
//! 3. area select gets a default answer set; multiple choice needs 2 to 4 options
//! 4. list-valued question examples only for area select and binary jobs
//! 5. `groundtruth` and `groundtruth_uri` are exclusive
//! 6. exactly one of `taskdata` and `taskdata_uri`
//! 7. `requester_min_repeats` is raised to 4 for multiple choice
//! 8. `start_date` and `expiration_date` come together, ordered, at most 7 days apart
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

pub mod models;
pub mod validation;

// Re-export commonly used types for convenience
pub use models::{
    GroundtruthEntry, GroundtruthValidator, Manifest, ManifestValidator, NestedManifest, NestedManifestValidator,
    Preprocess, PreprocessValidator, Presence, RequestType, RestrictedAudience, RestrictedAudienceValidator, TaskData,
    TaskDataValidator, ViaDataManifest, ViaDataManifestValidator,
};
pub use validation::{
    create_groundtruth_validator, create_manifest_validator, create_nested_manifest_validator,
    create_preprocess_validator, create_restricted_audience_validator, create_taskdata_validator,
    create_via_validator, validate_manifests_batch, ErrorKind, FieldPath, PathSegment, SchemaValidator,
    ValidationConfig, ValidationContext, ValidationError, ValidationErrors, ValidationHelpers, ValidationMode,
    ValidationResult,
};
