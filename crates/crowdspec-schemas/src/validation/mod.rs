//! Validation module for Manifest, TaskData and Groundtruth documents
//!
//! Validation runs in two layers:
//!
//! - **Shape**: every field is read and checked against its intrinsic type,
//!   format and range constraints; all shape errors are collected
//! - **Rules**: an ordered list of named cross-field rules runs over the shaped
//!   record, possibly returning a new record with defaults injected
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

pub mod base;
pub mod error;
pub mod rules;
pub mod shape;

// Re-export commonly used types
pub use base::{SchemaValidator, ValidationContext, ValidationHelpers, ValidationMode, MIN_URL_LENGTH};
pub use error::{
    ErrorKind, FieldPath, PathSegment, ValidationError, ValidationErrors, ValidationResult, Violation,
};
pub use rules::{manifest_rules, nested_manifest_rules, ChallengeFields, Outcome, Rule, RuleEngine};

use crate::models::{
    GroundtruthValidator, ManifestValidator, NestedManifestValidator, PreprocessValidator, RequestType,
    RestrictedAudienceValidator, TaskDataValidator, ViaDataManifestValidator,
};
use serde::{Deserialize, Serialize};

/// Convenience function to create a Manifest validator
///
/// # Examples
///
/// ```rust
/// use crowdspec_schemas::validation::{create_manifest_validator, SchemaValidator};
/// use serde_json::json;
///
/// let validator = create_manifest_validator();
/// let manifest = json!({
///     "job_mode": "batch",
///     "request_type": "image_label_binary",
///     "requester_question": {"en": "is this a cat?"},
///     "task_bid_price": 1.0,
///     "oracle_stake": 0.05,
///     "job_total_tasks": 10,
///     "taskdata_uri": "https://example.com/taskdata.json"
/// });
///
/// let validated = validator.validate(&manifest).unwrap();
/// assert_eq!(validated.requester_max_repeats, 100);
/// ```
pub fn create_manifest_validator() -> ManifestValidator {
    ManifestValidator::new()
}

/// Convenience function to create a NestedManifest validator
pub fn create_nested_manifest_validator() -> NestedManifestValidator {
    NestedManifestValidator::new()
}

/// Convenience function to create a TaskData entry validator
pub fn create_taskdata_validator() -> TaskDataValidator {
    TaskDataValidator::new()
}

/// Convenience function to create a Groundtruth entry validator for one job type
pub fn create_groundtruth_validator(request_type: RequestType) -> GroundtruthValidator {
    GroundtruthValidator::new(request_type)
}

/// Convenience function to create a RestrictedAudience validator
pub fn create_restricted_audience_validator() -> RestrictedAudienceValidator {
    RestrictedAudienceValidator::new()
}

/// Convenience function to create a Preprocess validator
pub fn create_preprocess_validator() -> PreprocessValidator {
    PreprocessValidator::new()
}

/// Validator for VIA results documents
pub fn create_via_validator() -> ViaDataManifestValidator {
    ViaDataManifestValidator::new()
}

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Validation mode to use
    pub mode: ValidationMode,
    /// Whether to stop on first rule failure or collect all failures
    pub fail_fast: bool,
    /// Maximum number of errors to collect (0 = unlimited)
    pub max_errors: usize,
    /// Whether a key set to `null` counts as present for the
    /// groundtruth/groundtruth_uri exclusivity rule
    pub key_presence_exclusivity: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            mode: ValidationMode::Permissive,
            fail_fast: true,
            max_errors: 0,
            key_presence_exclusivity: true,
        }
    }
}

impl ValidationConfig {
    /// Create a configuration for strict validation
    pub fn strict() -> Self {
        Self {
            mode: ValidationMode::Strict,
            ..Self::default()
        }
    }

    /// Create a configuration for permissive validation
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Enable or disable fail-fast mode
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Collect every rule failure instead of stopping at the first one
    pub fn collect_all(self) -> Self {
        self.with_fail_fast(false)
    }

    /// Set maximum number of errors to collect
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }

    /// Only count non-null values for groundtruth exclusivity
    pub fn with_key_presence_exclusivity(mut self, enabled: bool) -> Self {
        self.key_presence_exclusivity = enabled;
        self
    }

    /// Whether `count` collected errors means collection should stop
    pub fn limit_reached(&self, count: usize) -> bool {
        count > 0 && (self.fail_fast || (self.max_errors > 0 && count >= self.max_errors))
    }
}

/// Batch validation for multiple Manifest documents
///
/// Every error path is rooted at the index of the failing document.
pub fn validate_manifests_batch(
    manifests: &[serde_json::Value],
    config: &ValidationConfig,
) -> Result<(), ValidationErrors> {
    let validator = create_manifest_validator();

    let mut errors = ValidationErrors::new();
    let context = ValidationContext::new(config.clone());

    for (i, manifest) in manifests.iter().enumerate() {
        let manifest_context = context.child_index(i);
        match validator.validate_with_context(manifest, &manifest_context) {
            Ok(_) => continue,
            Err(failures) => {
                errors.extend(failures);

                if config.limit_reached(errors.len()) {
                    break;
                }
            }
        }
    }

    errors.into_result()
}
