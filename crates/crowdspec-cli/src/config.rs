//! Config file loading for the CLI
//!
//! Configuration comes from default values, overridden by the first
//! configuration file found (YAML or JSON), overridden in turn by
//! command-line switches.
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use anyhow::Context;
use crowdspec_core::{FetchConfig, RemoteConfig};
use crowdspec_schemas::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Settings read from `--config` or the default locations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema and rule validation settings
    pub validation: ValidationConfig,

    /// HTTP timeouts for remote documents
    pub fetch: FetchConfig,

    /// Remote validation switches
    pub remote: RemoteConfig,
}

fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|s| s.to_str()), Some("yaml") | Some("yml"))
}

impl Config {
    /// Parse one file; `.yaml`/`.yml` is YAML, anything else JSON
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        config.fetch.validate().map_err(Error::config)?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// First readable default location wins, else built-in defaults
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to load config");
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// An explicit path must exist; otherwise fall back to `load`
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(path) if !path.exists() => Err(Error::FileNotFound {
                path: path.to_path_buf(),
            }),
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".crowdspec.yaml"),
            PathBuf::from(".crowdspec.json"),
            PathBuf::from("crowdspec.yaml"),
            PathBuf::from("crowdspec.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let crowdspec_dir = config_dir.join("crowdspec");
            paths.push(crowdspec_dir.join("config.yaml"));
            paths.push(crowdspec_dir.join("config.json"));
        }

        paths
    }

    /// Render in the given format
    pub fn render(&self, yaml: bool) -> Result<String> {
        if yaml {
            Ok(serde_yaml::to_string(self)?)
        } else {
            Ok(serde_json::to_string_pretty(self)?)
        }
    }

    /// Write in the format implied by the extension, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.render(is_yaml(path))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}
