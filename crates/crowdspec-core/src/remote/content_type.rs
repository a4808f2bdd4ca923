//! Image content-type probing
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use super::{bad_status, fetch_failed, RemoteDocumentValidator};
use crate::fetch::DocumentFetcher;
use crate::{Error, Result};
use crowdspec_schemas::models::QuestionExample;
use crowdspec_schemas::validation::MIN_URL_LENGTH;
use crowdspec_schemas::{
    FieldPath, Manifest, RequestType, ValidationContext, ValidationError, ValidationErrors, ValidationHelpers,
};
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Media types accepted for labeling images
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// Key inside an answer set entry that holds an example image
pub const ANSWER_EXAMPLE_KEY: &str = "answer_example_uri";

impl<F: DocumentFetcher> RemoteDocumentValidator<F> {
    pub(crate) fn should_probe(&self, request_type: Option<RequestType>) -> bool {
        self.config.validate_content_type && request_type.is_some_and(|t| t.probes_content_type())
    }

    /// HEAD-probe `uri` and require an image content type
    pub async fn probe_content_type(&self, uri: &Url, path: &FieldPath) -> Result<()> {
        debug!(%uri, path = %path, "probing content type");
        let response = self.fetcher.head(uri).await.map_err(|e| fetch_failed(uri, path, e))?;
        if !response.is_success() {
            return Err(bad_status(uri, path, response.status));
        }

        match response.media_type() {
            Some(media) if ALLOWED_IMAGE_TYPES.contains(&media.as_str()) => Ok(()),
            other => {
                let error = ValidationError::rule(
                    "content_type",
                    path.clone(),
                    format!(
                        "Unsupported content type {} for {}",
                        other.as_deref().unwrap_or("(none)"),
                        uri
                    ),
                )
                .with_input(Value::String(uri.to_string()));
                Err(Error::Rule(error.into()))
            }
        }
    }

    /// Probe the question example and every answer example image
    pub async fn validate_example_images(&self, manifest: &Manifest) -> Result<()> {
        let images = example_images(manifest, &self.context())?;
        debug!(count = images.len(), "validating example images");
        for (uri, path) in &images {
            self.probe_content_type(uri, path).await?;
        }
        Ok(())
    }
}

/// Example image URLs of a Manifest with the field each came from
pub fn example_images(
    manifest: &Manifest,
    context: &ValidationContext,
) -> Result<Vec<(Url, FieldPath)>> {
    let mut images = Vec::new();

    let question = context.path.child("requester_question_example");
    match &manifest.requester_question_example {
        Some(QuestionExample::Single(url)) => images.push((url.clone(), question)),
        Some(QuestionExample::Many(urls)) => {
            images.extend(urls.iter().enumerate().map(|(i, url)| (url.clone(), question.index(i))));
        }
        None => {}
    }

    let mut errors = ValidationErrors::new();
    let answer_sets = context.child("requester_restricted_answer_set");
    for (key, entry) in manifest.requester_restricted_answer_set.iter().flatten() {
        let Some(raw) = entry.get(ANSWER_EXAMPLE_KEY) else {
            continue;
        };
        let entry_context = answer_sets.child(key.as_str()).child(ANSWER_EXAMPLE_KEY);
        match ValidationHelpers::validate_url(raw, MIN_URL_LENGTH, &entry_context) {
            Ok(url) => images.push((url, entry_context.path)),
            Err(error) => errors.add(error),
        }
    }
    errors.into_result()?;

    Ok(images)
}
