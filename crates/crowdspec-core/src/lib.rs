//! Crowdspec Core - remote validation of labeling job documents
//!
//! This crate fetches the documents a validated Manifest refers to and checks
//! them with the schemas of `crowdspec-schemas`.
//!
//! # Main Components
//!
//! - **Error Handling**: One error taxonomy using `thiserror` and `anyhow`
//! - **Fetch Capability**: The [`DocumentFetcher`] trait and its reqwest implementation
//! - **Remote Validation**: Taskdata and groundtruth documents, image content
//!   types and the verification key cross-check
//!
//! # Example
//!
//! ```no_run
//! use crowdspec_core::{HttpFetcher, RemoteDocumentValidator, Result};
//! use crowdspec_schemas::{create_manifest_validator, SchemaValidator};
//! use serde_json::json;
//!
//! async fn example() -> Result<()> {
//!     let manifest = create_manifest_validator()
//!         .validate(&json!({
//!             "job_mode": "batch",
//!             "request_type": "image_label_binary",
//!             "task_bid_price": 1.0,
//!             "oracle_stake": 0.05,
//!             "job_total_tasks": 10,
//!             "taskdata_uri": "https://example.com/taskdata.json"
//!         }))?;
//!
//!     let validator = RemoteDocumentValidator::new(HttpFetcher::with_default_config()?);
//!     let documents = validator.validate_manifest_uris(&manifest).await?;
//!     println!("{} taskdata entries", documents.taskdata.map_or(0, |t| t.len()));
//!     Ok(())
//! }
//! ```
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod fetch;
pub mod http;
pub mod remote;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use fetch::{DocumentFetcher, FetchError, FetchResponse};
pub use http::{FetchConfig, HttpFetcher};
pub use remote::{GroundtruthDocument, RemoteConfig, RemoteDocumentValidator, RemoteDocuments, ALLOWED_IMAGE_TYPES};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
