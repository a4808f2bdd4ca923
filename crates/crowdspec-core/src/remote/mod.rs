//! Remote document validation
//!
//! Fetches the taskdata and groundtruth documents a Manifest points to and
//! validates every entry with the schemas of `crowdspec-schemas`. Errors are
//! reported under the URI field they came from, e.g.
//! `$.taskdata_uri[3].datapoint_uri` or `$.groundtruth_uri.<key>`.
//!
//! A single fetch attempt is made per URI.
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

pub mod content_type;
pub mod verification;

pub use content_type::ALLOWED_IMAGE_TYPES;
pub use verification::{groundtruth_keys, taskdata_keys};

use crate::fetch::{DocumentFetcher, FetchError};
use crate::{Error, Result};
use crowdspec_schemas::models::{GroundtruthEntry, GroundtruthKey};
use crowdspec_schemas::validation::shape::type_name;
use crowdspec_schemas::{
    FieldPath, GroundtruthValidator, Manifest, RequestType, TaskData, ValidationConfig, ValidationContext,
    ValidationError, ValidationErrors,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Remote validation switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// HEAD-probe the first entry's image of each document
    pub validate_content_type: bool,
    /// Fetch taskdata and groundtruth at the same time
    pub fetch_concurrently: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            validate_content_type: true,
            fetch_concurrently: true,
        }
    }
}

/// Validated groundtruth document entries, in document order
pub type GroundtruthDocument = Vec<(GroundtruthKey, GroundtruthEntry)>;

/// Documents fetched for one Manifest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteDocuments {
    pub taskdata: Option<Vec<TaskData>>,
    pub groundtruth: Option<GroundtruthDocument>,
}

/// Validates documents referenced by a Manifest through a [`DocumentFetcher`]
#[derive(Debug, Clone)]
pub struct RemoteDocumentValidator<F> {
    fetcher: F,
    config: RemoteConfig,
    validation: ValidationConfig,
}

pub(crate) fn fetch_failed(uri: &Url, path: &FieldPath, error: FetchError) -> Error {
    warn!(%uri, path = %path, error = %error, "fetch failed");
    Error::Fetch {
        uri: uri.to_string(),
        path: path.clone(),
        status: None,
        message: error.to_string(),
        source: Some(anyhow::Error::new(error)),
    }
}

pub(crate) fn bad_status(uri: &Url, path: &FieldPath, status: u16) -> Error {
    warn!(%uri, path = %path, status, "fetch returned an error status");
    Error::Fetch {
        uri: uri.to_string(),
        path: path.clone(),
        status: Some(status),
        message: format!("HTTP {}", status),
        source: None,
    }
}

impl<F: DocumentFetcher> RemoteDocumentValidator<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            config: RemoteConfig::default(),
            validation: ValidationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RemoteConfig) -> Self {
        self.config = config;
        self
    }

    /// Configuration used for entry validation
    pub fn with_validation_config(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn context(&self) -> ValidationContext {
        ValidationContext::new(self.validation.clone())
    }

    async fn fetch_json(&self, uri: &Url, path: &FieldPath) -> Result<Value> {
        debug!(%uri, path = %path, "fetching document");
        let response = self
            .fetcher
            .get(uri)
            .await
            .map_err(|e| fetch_failed(uri, path, e))?;
        if !response.is_success() {
            return Err(bad_status(uri, path, response.status));
        }

        debug!(%uri, bytes = response.body.len(), "document fetched");
        serde_json::from_slice(&response.body).map_err(|source| Error::Parse {
            uri: uri.to_string(),
            path: path.clone(),
            source,
        })
    }

    /// Fetch a taskdata document and validate every entry
    pub async fn validate_taskdata_uri(&self, uri: &Url, request_type: Option<RequestType>) -> Result<Vec<TaskData>> {
        let context = self.context().child("taskdata_uri");
        let document = self.fetch_json(uri, &context.path).await?;

        let Value::Array(items) = &document else {
            let error = ValidationError::shape(
                context.path.clone(),
                format!("Expected array, found {}", type_name(&document)),
            );
            return Err(Error::Shape(error.into()));
        };
        if items.is_empty() {
            return Err(Error::EmptyDocument {
                uri: uri.to_string(),
                path: context.path.clone(),
            });
        }

        let mut entries = Vec::with_capacity(items.len());
        let mut errors = ValidationErrors::new();
        for (i, item) in items.iter().enumerate() {
            match TaskData::from_value(item, &context.child_index(i)) {
                Ok(entry) => entries.push(entry),
                Err(failures) => {
                    errors.extend(failures);
                    if context.config.limit_reached(errors.len()) {
                        break;
                    }
                }
            }
        }
        errors.into_result()?;
        debug!(%uri, entries = entries.len(), "taskdata document validated");

        // Only the first entry is probed
        if self.should_probe(request_type) {
            if let Some(datapoint_uri) = entries.first().and_then(|entry| entry.datapoint_uri.as_ref()) {
                let path = context.path.index(0).child("datapoint_uri");
                self.probe_content_type(datapoint_uri, &path).await?;
            }
        }

        Ok(entries)
    }

    /// Fetch a groundtruth document and validate every entry for `request_type`
    pub async fn validate_groundtruth_uri(&self, uri: &Url, request_type: RequestType) -> Result<GroundtruthDocument> {
        let context = self.context().child("groundtruth_uri");
        let document = self.fetch_json(uri, &context.path).await?;

        let is_empty = match &document {
            Value::Object(object) => object.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        };
        if is_empty {
            return Err(Error::EmptyDocument {
                uri: uri.to_string(),
                path: context.path.clone(),
            });
        }

        let entries = GroundtruthValidator::new(request_type).validate_document(&document, &context)?;
        debug!(%uri, entries = entries.len(), %request_type, "groundtruth document validated");

        if self.should_probe(Some(request_type)) {
            if let Some((GroundtruthKey::Url(key), _)) = entries.first() {
                let path = context.path.child(key.as_str());
                self.probe_content_type(key, &path).await?;
            }
        }

        Ok(entries)
    }

    async fn taskdata_for(&self, manifest: &Manifest) -> Result<Option<Vec<TaskData>>> {
        match &manifest.taskdata_uri {
            Some(uri) => self.validate_taskdata_uri(uri, manifest.request_type).await.map(Some),
            None => Ok(None),
        }
    }

    async fn groundtruth_for(&self, manifest: &Manifest) -> Result<Option<GroundtruthDocument>> {
        let Some(uri) = manifest.groundtruth_uri.as_option() else {
            return Ok(None);
        };
        let Some(request_type) = manifest.request_type else {
            let error = ValidationError::missing_discriminant("groundtruth_uri", FieldPath::root().child("request_type"));
            return Err(Error::Rule(error.into()));
        };
        self.validate_groundtruth_uri(uri, request_type).await.map(Some)
    }

    /// Fetch and validate every document the Manifest references
    ///
    /// Each URI is fetched once. When both fail, the taskdata error wins.
    pub async fn validate_manifest_uris(&self, manifest: &Manifest) -> Result<RemoteDocuments> {
        let (taskdata, groundtruth) = if self.config.fetch_concurrently {
            tokio::join!(self.taskdata_for(manifest), self.groundtruth_for(manifest))
        } else {
            (self.taskdata_for(manifest).await, self.groundtruth_for(manifest).await)
        };

        Ok(RemoteDocuments {
            taskdata: taskdata?,
            groundtruth: groundtruth?,
        })
    }

    /// Validate both documents and require their keys to match
    pub async fn validate_is_verification(&self, manifest: &Manifest) -> Result<RemoteDocuments> {
        let (Some(taskdata_uri), Some(groundtruth_uri)) =
            (manifest.taskdata_uri.as_ref(), manifest.groundtruth_uri.as_option())
        else {
            return Err(Error::MissingSource);
        };

        let documents = self.validate_manifest_uris(manifest).await?;
        verification::check_keys(manifest.request_type, taskdata_uri, groundtruth_uri, &documents)?;
        Ok(documents)
    }
}
