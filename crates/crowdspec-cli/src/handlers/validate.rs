//! Validation command handler and related utilities
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crate::cli::{BatchArgs, DocumentArgs, GroundtruthArgs, ManifestArgs, TaskdataArgs, ValidateTarget};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use crowdspec_core::{HttpFetcher, RemoteDocumentValidator, RemoteDocuments};
use crowdspec_schemas::{
    create_groundtruth_validator, create_manifest_validator, create_nested_manifest_validator,
    create_preprocess_validator, create_taskdata_validator, create_via_validator, validate_manifests_batch, Manifest,
    SchemaValidator, ValidationConfig, ValidationContext, ValidationErrors,
};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Handle the validate command
pub async fn handle_validate(target: ValidateTarget, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match target {
        ValidateTarget::Manifest(args) => validate_manifest(args, config, output).await,
        ValidateTarget::Taskdata(args) => validate_taskdata(args, config, output),
        ValidateTarget::Groundtruth(args) => validate_groundtruth(args, config, output),
        ValidateTarget::Batch(args) => validate_batch(args, config, output),
        ValidateTarget::Via(args) => validate_via(args, config, output),
        ValidateTarget::Preprocess(args) => validate_preprocess(args, config, output),
    }
}

/// Read a JSON or YAML document
pub fn read_document(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = content.len(), "document read");

    let is_yaml = matches!(path.extension().and_then(|s| s.to_str()), Some("yaml") | Some("yml"));
    if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "YAML".to_string(),
            message: e.to_string(),
        })
    } else {
        serde_json::from_str(&content).map_err(|e| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "JSON".to_string(),
            message: e.to_string(),
        })
    }
}

/// Print validation errors and turn them into a CLI error
fn report<T>(output: &mut OutputWriter, result: std::result::Result<T, ValidationErrors>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(errors) => {
            warn!(errors = errors.len(), "validation failed");
            output.error("✗ Validation failed")?;
            output.validation_errors(&errors)?;
            Err(Error::ValidationFailed { count: errors.len() })
        }
    }
}

/// Report success; machine formats get a summary object
fn passed(output: &mut OutputWriter, message: &str, document: &str, entries: usize) -> Result<()> {
    output.success(message)?;
    if output.format() != crate::cli::OutputFormat::Human {
        output.data(&json!({"valid": true, "document": document, "entries": entries}))?;
    }
    Ok(())
}

fn validate_entries<T, F>(
    items: &[Value],
    context: &ValidationContext,
    validate: F,
) -> std::result::Result<Vec<T>, ValidationErrors>
where
    F: Fn(&Value, &ValidationContext) -> std::result::Result<T, ValidationErrors>,
{
    let mut entries = Vec::with_capacity(items.len());
    let mut errors = ValidationErrors::new();

    for (i, item) in items.iter().enumerate() {
        match validate(item, &context.child_index(i)) {
            Ok(entry) => entries.push(entry),
            Err(failures) => {
                errors.extend(failures);
                if context.config.limit_reached(errors.len()) {
                    break;
                }
            }
        }
    }

    errors.into_result().map(|_| entries)
}

#[instrument(skip_all, fields(file = %args.file.display(), nested = args.nested))]
async fn validate_manifest(args: ManifestArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("validate_manifest", &args.file.display().to_string());
    let value = read_document(&args.file)?;
    let validation = args.flags.apply(&config.validation);
    let context = ValidationContext::new(validation.clone());

    if args.nested {
        let nested = report(output, create_nested_manifest_validator().validate_with_context(&value, &context))?;
        info!("nested manifest is valid");
        if args.print {
            output.success("✓ NestedManifest is valid")?;
            return output.data(&nested);
        }
        return passed(output, "✓ NestedManifest is valid", "nested_manifest", 1);
    }

    let manifest = report(output, create_manifest_validator().validate_with_context(&value, &context))?;
    info!(request_type = ?manifest.request_type, "manifest is valid");
    output.success("✓ Manifest is valid")?;

    if args.fetch || args.verify || args.check_images {
        let documents = remote_checks(&args, &manifest, config, validation, output).await?;
        if let Some(taskdata) = &documents.taskdata {
            output.success(&format!("✓ taskdata_uri: {} valid entries", taskdata.len()))?;
        }
        if let Some(groundtruth) = &documents.groundtruth {
            output.success(&format!("✓ groundtruth_uri: {} valid entries", groundtruth.len()))?;
        }
        if args.verify {
            output.success("✓ taskdata and groundtruth keys match")?;
        }
    }

    if args.print {
        output.data(&manifest)
    } else if output.format() != crate::cli::OutputFormat::Human {
        output.data(&json!({"valid": true, "document": "manifest", "entries": 1}))
    } else {
        Ok(())
    }
}

async fn remote_checks(
    args: &ManifestArgs,
    manifest: &Manifest,
    config: &Config,
    validation: ValidationConfig,
    output: &mut OutputWriter,
) -> Result<RemoteDocuments> {
    let fetcher = HttpFetcher::new(config.fetch.clone())?;
    let validator = RemoteDocumentValidator::new(fetcher)
        .with_config(config.remote.clone())
        .with_validation_config(validation);

    let spinner = output.spinner("Fetching remote documents");
    let result = run_remote(&validator, manifest, args).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    result.or_else(|error| -> Result<RemoteDocuments> {
        output.error("✗ Remote validation failed")?;
        if let Some(errors) = error.validation_errors() {
            output.validation_errors(errors)?;
        }
        if let crowdspec_core::Error::KeyMismatch {
            missing_groundtruth,
            missing_taskdata,
            ..
        } = &error
        {
            for key in missing_groundtruth {
                output.error(&format!("  no groundtruth for {}", key))?;
            }
            for key in missing_taskdata {
                output.error(&format!("  no taskdata for {}", key))?;
            }
        }
        Err(error.into())
    })
}

async fn run_remote(
    validator: &RemoteDocumentValidator<HttpFetcher>,
    manifest: &Manifest,
    args: &ManifestArgs,
) -> crowdspec_core::Result<RemoteDocuments> {
    if args.check_images {
        validator.validate_example_images(manifest).await?;
    }
    if args.verify {
        validator.validate_is_verification(manifest).await
    } else if args.fetch {
        validator.validate_manifest_uris(manifest).await
    } else {
        Ok(RemoteDocuments::default())
    }
}

#[instrument(skip_all, fields(file = %args.file.display()))]
fn validate_taskdata(args: TaskdataArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let value = read_document(&args.file)?;
    let context = ValidationContext::new(args.flags.apply(&config.validation));
    let validator = create_taskdata_validator();

    let result = match &value {
        Value::Array(items) => validate_entries(items, &context, |item, c| validator.validate_with_context(item, c)),
        single => validator.validate_with_context(single, &context).map(|entry| vec![entry]),
    };
    let entries = report(output, result)?;

    if entries.is_empty() {
        output.warning("taskdata document has no entries")?;
    }
    passed(output, &format!("✓ {} taskdata entries are valid", entries.len()), "taskdata", entries.len())
}

#[instrument(skip_all, fields(file = %args.file.display(), request_type = %args.request_type))]
fn validate_groundtruth(args: GroundtruthArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let value = read_document(&args.file)?;
    let context = ValidationContext::new(args.flags.apply(&config.validation));

    let entries = report(
        output,
        create_groundtruth_validator(args.request_type).validate_document(&value, &context),
    )?;

    if entries.is_empty() {
        output.warning("groundtruth document has no entries")?;
    }
    passed(
        output,
        &format!("✓ {} groundtruth entries are valid for {}", entries.len(), args.request_type),
        "groundtruth",
        entries.len(),
    )
}

#[instrument(skip_all, fields(file = %args.file.display()))]
fn validate_batch(args: BatchArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let value = read_document(&args.file)?;
    let Value::Array(manifests) = value else {
        return Err(Error::InvalidFormat {
            path: args.file.clone(),
            expected: "array of manifests".to_string(),
            message: "top-level value is not an array".to_string(),
        });
    };

    report(output, validate_manifests_batch(&manifests, &args.flags.apply(&config.validation)))?;
    passed(output, &format!("✓ {} manifests are valid", manifests.len()), "manifest_batch", manifests.len())
}

#[instrument(skip_all, fields(file = %args.file.display()))]
fn validate_via(args: DocumentArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let value = read_document(&args.file)?;
    let context = ValidationContext::new(args.flags.apply(&config.validation));

    let via = report(output, create_via_validator().validate_with_context(&value, &context))?;
    if via.datapoints.is_empty() {
        output.warning("VIA document has no datapoints")?;
    }
    passed(
        output,
        &format!("✓ {} VIA datapoints are valid (version {})", via.datapoints.len(), via.version),
        "via",
        via.datapoints.len(),
    )
}

#[instrument(skip_all, fields(file = %args.file.display()))]
fn validate_preprocess(args: DocumentArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let value = read_document(&args.file)?;
    let context = ValidationContext::new(args.flags.apply(&config.validation));

    let preprocess = report(output, create_preprocess_validator().validate_with_context(&value, &context))?;
    debug!(pipeline = ?preprocess.pipeline, "preprocess validated");
    passed(output, "✓ Preprocess is valid", "preprocess", 1)
}
