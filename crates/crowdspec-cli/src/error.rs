//! Error types and handling for the CLI
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can end a `crowdspec` invocation with a non-zero exit
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Core(#[from] crowdspec_core::Error),

    /// A document failed validation; the errors were already reported
    #[error("Validation failed with {count} error(s)")]
    ValidationFailed { count: usize },

    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// A document was neither JSON nor YAML, or not the expected shape
    #[error("Invalid file format for {}: expected {}: {}", path.display(), expected, message)]
    InvalidFormat {
        path: PathBuf,
        expected: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{message}")]
    Other { message: String },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Process exit code; 2 means the documents are invalid, 10 means they
    /// could not be retrieved
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::ValidationFailed { .. } => 2,
            Self::Core(error) => match error {
                crowdspec_core::Error::Shape(_)
                | crowdspec_core::Error::Rule(_)
                | crowdspec_core::Error::EmptyDocument { .. }
                | crowdspec_core::Error::KeyMismatch { .. }
                | crowdspec_core::Error::MissingSource => 2,
                crowdspec_core::Error::Fetch { .. } | crowdspec_core::Error::Parse { .. } => 10,
                crowdspec_core::Error::Configuration { .. } => 5,
            },
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Other { .. } => 99,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Self::other(format!("{:#}", error))
    }
}

/// Render the final error line printed to stderr
pub fn format_error(error: &Error, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_separate_invalid_documents_from_fetch_failures() {
        assert_eq!(Error::ValidationFailed { count: 3 }.exit_code(), 2);
        assert_eq!(Error::Core(crowdspec_core::Error::MissingSource).exit_code(), 2);

        let fetch = crowdspec_core::Error::Fetch {
            uri: "https://domain.com/taskdata.json".to_string(),
            path: crowdspec_schemas::FieldPath::root().child("taskdata_uri"),
            status: Some(404),
            message: "HTTP 404".to_string(),
            source: None,
        };
        assert_eq!(Error::Core(fetch).exit_code(), 10);
    }

    #[test]
    fn test_format_error_without_color() {
        let formatted = format_error(&Error::config("bad timeout"), false);
        assert_eq!(formatted, "Error: Configuration error: bad timeout");
    }

    #[test]
    fn test_anyhow_context_is_kept() {
        let error: Error = anyhow::anyhow!("inner").context("outer").into();
        assert_eq!(error.to_string(), "outer: inner");
    }
}
