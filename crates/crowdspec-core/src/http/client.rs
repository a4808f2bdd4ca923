//! reqwest-backed document fetcher
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crate::fetch::{DocumentFetcher, FetchError, FetchResponse};
use crate::http::FetchConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as ReqwestClient, Method};
use tracing::{debug, warn};
use url::Url;

/// Fetches documents over HTTP with bounded timeouts and no retries
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// Underlying reqwest client
    client: ReqwestClient,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher
    pub fn new(config: FetchConfig) -> Result<Self> {
        config.validate().map_err(|message| Error::Configuration { message, source: None })?;

        let client = ReqwestClient::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e.into()),
            })?;

        Ok(Self { client, config })
    }

    /// Create with default configuration
    pub fn with_default_config() -> Result<Self> {
        Self::new(FetchConfig::default())
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn send(&self, method: Method, uri: &Url) -> std::result::Result<FetchResponse, FetchError> {
        debug!(%method, %uri, "sending request");
        let response = self
            .client
            .request(method.clone(), uri.clone())
            .send()
            .await
            .map_err(|e| {
                warn!(%method, %uri, error = %e, "request failed");
                from_request_error(e)
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = if method == Method::HEAD {
            Vec::new()
        } else {
            response.bytes().await.map_err(from_request_error)?.to_vec()
        };

        debug!(%method, %uri, status, bytes = body.len(), "request finished");
        Ok(FetchResponse {
            status,
            content_type,
            body,
        })
    }
}

fn from_request_error(error: reqwest::Error) -> FetchError {
    let failure = if error.is_timeout() {
        FetchError::timeout(format!("request timed out: {}", error))
    } else if error.is_connect() {
        FetchError::new(format!("connection failed: {}", error))
    } else {
        FetchError::new(error.to_string())
    };
    failure.with_source(error.into())
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn get(&self, uri: &Url) -> std::result::Result<FetchResponse, FetchError> {
        self.send(Method::GET, uri).await
    }

    async fn head(&self, uri: &Url) -> std::result::Result<FetchResponse, FetchError> {
        self.send(Method::HEAD, uri).await
    }
}
