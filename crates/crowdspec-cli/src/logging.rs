//! Logging setup for the Crowdspec CLI
//!
//! Diagnostics go to stderr through a `tracing-subscriber` fmt layer, so
//! stdout only ever carries validation results. Verbosity flags pick the
//! level unless `RUST_LOG` is set.
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
    /// Enable ANSI colors when stderr is a terminal
    pub console: bool,
    /// Include thread IDs
    pub thread_ids: bool,
    /// Include file and line numbers
    pub source_location: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Full,
    /// One JSON object per event, never colored
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            console: true,
            thread_ids: false,
            source_location: false,
        }
    }
}

impl LoggingConfig {
    /// Map `-v` occurrences to a level; `-vvv` and above also switch to
    /// the full format with thread ids
    pub fn from_verbosity(verbosity: u8) -> Self {
        let (level, source_location) = match verbosity {
            0 => ("warn", false),
            1 => ("info", false),
            2 => ("debug", true),
            _ => ("trace", true),
        };
        let firehose = verbosity >= 3;

        Self {
            level: level.to_string(),
            format: if firehose { LogFormat::Full } else { LogFormat::Compact },
            thread_ids: firehose,
            source_location,
            ..Self::default()
        }
    }

    /// Apply `CROWDSPEC_LOG_FORMAT`; `RUST_LOG` is read by the filter itself
    pub fn merge_with_env(&mut self) {
        let Ok(raw) = std::env::var("CROWDSPEC_LOG_FORMAT") else {
            return;
        };
        match LogFormat::from_str(&raw, true) {
            Ok(format) => self.format = format,
            Err(_) => tracing::warn!(value = %raw, "ignoring unknown CROWDSPEC_LOG_FORMAT"),
        }
    }
}

/// Install the global subscriber; logs always go to stderr
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the verbosity-derived level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let ansi = config.console && std::io::stderr().is_terminal();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let installed = match config.format {
        LogFormat::Compact => tracing::subscriber::set_global_default(builder.with_ansi(ansi).compact().finish()),
        LogFormat::Full => tracing::subscriber::set_global_default(builder.with_ansi(ansi).finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish()),
    };
    installed.map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!(level = %config.level, format = ?config.format, "logging ready");
    Ok(())
}

/// Wall-clock timing of CLI phases
pub mod timing {
    use std::time::{Duration, Instant};

    /// Logs how long a phase took when it goes out of scope
    pub struct Timer {
        phase: &'static str,
        subject: Option<String>,
        start: Instant,
    }

    impl Timer {
        pub fn new(phase: &'static str) -> Self {
            Self {
                phase,
                subject: None,
                start: Instant::now(),
            }
        }

        /// Timer for a phase acting on one document
        pub fn with_details(phase: &'static str, subject: &str) -> Self {
            Self {
                subject: Some(subject.to_string()),
                ..Self::new(phase)
            }
        }

        pub fn elapsed(&self) -> Duration {
            self.start.elapsed()
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            let elapsed_ms = self.elapsed().as_millis() as u64;
            match &self.subject {
                Some(subject) => tracing::debug!(phase = self.phase, %subject, elapsed_ms, "phase finished"),
                None => tracing::debug!(phase = self.phase, elapsed_ms, "phase finished"),
            }
        }
    }
}
