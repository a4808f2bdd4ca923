//! Argument tree for the `crowdspec` binary
//!
//! This module defines the CLI structure using clap's derive API.
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crate::logging::LogFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use crowdspec_schemas::{RequestType, ValidationConfig, ValidationMode};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Crowdspec CLI - validate crowd-labeling job documents
///
/// Checks manifests, taskdata and groundtruth files against their schemas
/// and cross-field rules, and optionally fetches the documents a manifest
/// refers to.
#[derive(Parser, Debug)]
#[command(
    name = "crowdspec",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print failures
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// YAML or JSON config file with validation, fetch and remote sections
    #[arg(short, long, global = true, env = "CROWDSPEC_CONFIG")]
    pub config: Option<PathBuf>,

    /// How results and validation reports are printed
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Log format written to stderr
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    /// Never color output, even on a terminal
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a job document
    #[command(subcommand)]
    Validate(ValidateTarget),

    /// Show or create configuration files
    Config(ConfigArgs),

    /// Print a shell completion script
    Completions(CompletionsArgs),
}

/// Document kinds the validate command understands
#[derive(Subcommand, Debug)]
pub enum ValidateTarget {
    /// Validate a Manifest (or a NestedManifest with --nested)
    Manifest(ManifestArgs),

    /// Validate a taskdata document (one entry or an array of entries)
    Taskdata(TaskdataArgs),

    /// Validate a groundtruth document for one request type
    Groundtruth(GroundtruthArgs),

    /// Validate a JSON array of manifests
    Batch(BatchArgs),

    /// Validate a VIA results document
    Via(DocumentArgs),

    /// Validate a preprocessing pipeline definition
    Preprocess(DocumentArgs),
}

/// Validation switches shared by every validate target
#[derive(Args, Debug, Clone, Default)]
pub struct ValidationFlags {
    /// Reject unknown fields and groundtruth without an entry schema
    #[arg(long)]
    pub strict: bool,

    /// Report every rule failure instead of stopping at the first one
    #[arg(long)]
    pub collect_all: bool,

    /// Stop after this many errors (0 = unlimited)
    #[arg(long, value_name = "N")]
    pub max_errors: Option<usize>,
}

/// Arguments for `validate manifest`
#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Path to the manifest file (JSON or YAML)
    #[arg(value_name = "MANIFEST")]
    pub file: PathBuf,

    /// Validate as a NestedManifest (one challenge of a multi-challenge job)
    #[arg(long, conflicts_with_all = ["fetch", "verify", "check_images"])]
    pub nested: bool,

    #[command(flatten)]
    pub flags: ValidationFlags,

    /// Fetch and validate taskdata_uri and groundtruth_uri
    #[arg(long)]
    pub fetch: bool,

    /// Fetch both documents and require their keys to match
    #[arg(long)]
    pub verify: bool,

    /// Probe the question and answer example images
    #[arg(long)]
    pub check_images: bool,

    /// Print the validated manifest with defaults applied
    #[arg(long)]
    pub print: bool,
}

/// Arguments for `validate taskdata`
#[derive(Args, Debug)]
pub struct TaskdataArgs {
    /// Path to the taskdata file (JSON or YAML)
    #[arg(value_name = "TASKDATA")]
    pub file: PathBuf,

    #[command(flatten)]
    pub flags: ValidationFlags,
}

/// A single document validated without extra options
#[derive(Args, Debug)]
pub struct DocumentArgs {
    /// Path to the document (JSON or YAML)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub flags: ValidationFlags,
}

/// Arguments for `validate groundtruth`
#[derive(Args, Debug)]
pub struct GroundtruthArgs {
    /// Path to the groundtruth file (JSON or YAML)
    #[arg(value_name = "GROUNDTRUTH")]
    pub file: PathBuf,

    /// Job type whose entry schema applies
    #[arg(short, long, value_parser = parse_request_type)]
    pub request_type: RequestType,

    #[command(flatten)]
    pub flags: ValidationFlags,
}

/// Arguments for `validate batch`
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Path to a file holding an array of manifests
    #[arg(value_name = "MANIFESTS")]
    pub file: PathBuf,

    #[command(flatten)]
    pub flags: ValidationFlags,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// `crowdspec config` actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show(ConfigShowArgs),

    /// Write a configuration file with default values
    Init(ConfigInitArgs),
}

#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Serialization of the effective configuration
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the file; the extension picks YAML or JSON
    #[arg(default_value = "crowdspec.yaml")]
    pub path: PathBuf,

    /// Force overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Formats `config show` can print
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Status lines plus an aligned problem report
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Indented JSON
    JsonPretty,
}

/// Shells with completion support
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

fn parse_request_type(value: &str) -> Result<RequestType, String> {
    value.parse()
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// `-v` count, forced to 0 by `--quiet`
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Color unless `--no-color` is set or stdout is not a terminal
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl ValidationFlags {
    /// Layer the command-line switches over a configured base
    pub fn apply(&self, base: &ValidationConfig) -> ValidationConfig {
        let mut config = base.clone();
        if self.strict {
            config.mode = ValidationMode::Strict;
        }
        if self.collect_all {
            config.fail_fast = false;
        }
        if let Some(max_errors) = self.max_errors {
            config.max_errors = max_errors;
        }
        config
    }
}

impl Shell {
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_manifest_flags_parse() {
        let cli = Cli::parse_from([
            "crowdspec", "-vv", "validate", "manifest", "job.json", "--strict", "--collect-all", "--fetch",
        ]);
        assert_eq!(cli.verbosity_level(), 2);
        match cli.command {
            Commands::Validate(ValidateTarget::Manifest(args)) => {
                assert!(args.flags.strict);
                assert!(args.flags.collect_all);
                assert!(args.fetch);
                assert!(!args.nested);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_groundtruth_request_type_is_parsed() {
        let cli = Cli::parse_from([
            "crowdspec", "validate", "groundtruth", "gt.json", "--request-type", "image_label_binary",
        ]);
        match cli.command {
            Commands::Validate(ValidateTarget::Groundtruth(args)) => {
                assert_eq!(args.request_type, RequestType::ImageLabelBinary);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let err = Cli::try_parse_from(["crowdspec", "validate", "groundtruth", "gt.json", "-r", "video"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_nested_conflicts_with_fetch() {
        let err = Cli::try_parse_from(["crowdspec", "validate", "manifest", "job.json", "--nested", "--fetch"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_flags_layer_over_config() {
        let base = ValidationConfig::default().with_max_errors(5);
        let flags = ValidationFlags {
            strict: true,
            collect_all: true,
            max_errors: None,
        };
        let config = flags.apply(&base);
        assert_eq!(config.mode, ValidationMode::Strict);
        assert!(!config.fail_fast);
        assert_eq!(config.max_errors, 5);

        assert_eq!(ValidationFlags::default().apply(&base), base);
    }

    #[test]
    fn test_document_targets_share_arguments() {
        let cli = Cli::parse_from(["crowdspec", "validate", "via", "results.json", "--collect-all"]);
        match cli.command {
            Commands::Validate(ValidateTarget::Via(args)) => {
                assert_eq!(args.file, PathBuf::from("results.json"));
                assert!(args.flags.collect_all);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::parse_from(["crowdspec", "validate", "preprocess", "pipeline.yaml"]);
        assert!(matches!(cli.command, Commands::Validate(ValidateTarget::Preprocess(_))));
    }

    #[test]
    fn test_quiet_silences_verbosity() {
        let cli = Cli::parse_from(["crowdspec", "--quiet", "validate", "taskdata", "td.json"]);
        assert_eq!(cli.verbosity_level(), 0);
    }
}
