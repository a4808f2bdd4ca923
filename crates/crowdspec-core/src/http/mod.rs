//! HTTP implementation of the fetch capability
//!
//! This module provides:
//! - Timeout configuration with validation
//! - A reqwest-backed [`DocumentFetcher`](crate::fetch::DocumentFetcher)
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

pub mod client;
pub mod timeout;

pub use client::HttpFetcher;
pub use timeout::{FetchConfig, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS};
