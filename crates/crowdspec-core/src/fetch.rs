//! Fetch capability consumed by the remote validator
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Status, content type and body of a GET or HEAD request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    /// Raw `Content-Type` header value
    pub content_type: Option<String>,
    /// Empty for HEAD requests
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: Vec::new(),
        }
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_body<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Media type without parameters, lowercased
    pub fn media_type(&self) -> Option<String> {
        self.content_type
            .as_deref()
            .and_then(|value| value.split(';').next())
            .map(|media| media.trim().to_ascii_lowercase())
            .filter(|media| !media.is_empty())
    }
}

/// Transport failure: the request produced no response at all
#[derive(Error, Debug)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
    pub timed_out: bool,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl FetchError {
    pub fn new<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
            timed_out: false,
            source: None,
        }
    }

    pub fn timeout<M: Into<String>>(message: M) -> Self {
        Self {
            timed_out: true,
            ..Self::new(message)
        }
    }

    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }
}

/// Retrieves remote documents and probes URLs
///
/// Timeouts are the implementation's concern; a timeout surfaces as a
/// [`FetchError`] like any other transport failure. Non-2xx statuses are
/// returned as responses, not errors.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch a document body
    async fn get(&self, uri: &Url) -> Result<FetchResponse, FetchError>;

    /// Probe a URL for its status and content type
    async fn head(&self, uri: &Url) -> Result<FetchResponse, FetchError>;
}

#[async_trait]
impl<T: DocumentFetcher + ?Sized> DocumentFetcher for Arc<T> {
    async fn get(&self, uri: &Url) -> Result<FetchResponse, FetchError> {
        (**self).get(uri).await
    }

    async fn head(&self, uri: &Url) -> Result<FetchResponse, FetchError> {
        (**self).head(uri).await
    }
}
