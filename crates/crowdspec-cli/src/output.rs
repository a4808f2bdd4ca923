//! Output formatting and writing utilities
//!
//! Results and validation reports are rendered as JSON, YAML or a
//! path-aligned text report. Status lines are only written in human mode so
//! machine output stays parseable.
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::{Color, Colorize};
use crowdspec_schemas::{ErrorKind, ValidationError, ValidationErrors};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;
use tracing::debug;

/// Renders values and validation reports in one output format
pub trait OutputFormatter {
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Render a validation report; human mode gets the text report
    fn format_validation_errors(&self, errors: &ValidationErrors) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        let rendered = match self {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::JsonPretty | OutputFormat::Human => serde_json::to_string_pretty(value)?,
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
        };
        Ok(rendered)
    }

    fn format_validation_errors(&self, errors: &ValidationErrors) -> Result<String> {
        if *self == OutputFormat::Human {
            return Ok(report(errors));
        }
        self.format(errors)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Success,
    Warning,
    Error,
}

impl Level {
    fn color(self) -> Color {
        match self {
            Level::Success => Color::Green,
            Level::Warning => Color::Yellow,
            Level::Error => Color::Red,
        }
    }

    fn plain_prefix(self) -> &'static str {
        match self {
            Level::Success => "",
            Level::Warning => "WARNING: ",
            Level::Error => "ERROR: ",
        }
    }
}

/// Writes status lines and results to stdout or a custom sink
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && io::stderr().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Writer over an arbitrary sink; never shows spinners
    #[allow(dead_code)]
    pub fn with_writer(format: OutputFormat, use_color: bool, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color,
            show_progress: false,
            quiet,
            writer,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Status line for a check that passed; suppressed by `--quiet`
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.status(Level::Success, message)
    }

    pub fn warning(&mut self, message: &str) -> Result<()> {
        self.status(Level::Warning, message)
    }

    /// Failure status line; shown even in quiet mode
    pub fn error(&mut self, message: &str) -> Result<()> {
        self.status(Level::Error, message)
    }

    fn status(&mut self, level: Level, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            debug!(?level, status = message, "status line suppressed for machine output");
            return Ok(());
        }

        let line = if self.use_color {
            message.color(level.color()).to_string()
        } else {
            format!("{}{}", level.plain_prefix(), message)
        };
        self.writeln(&line)
    }

    /// Serialize `value` in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        self.writeln(formatted.trim_end())
    }

    /// Write a validation report; machine formats always print it
    pub fn validation_errors(&mut self, errors: &ValidationErrors) -> Result<()> {
        let formatted = self.format.format_validation_errors(errors)?;
        self.writeln(formatted.trim_end())
    }

    /// Spinner on stderr while remote documents are fetched
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));
        Some(spinner)
    }
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Shape => "shape",
        ErrorKind::Rule => "rule",
        ErrorKind::MissingDiscriminant => "missing request_type",
    }
}

/// One line per problem, aligned on the field path
fn report(errors: &ValidationErrors) -> String {
    let shapes = errors.iter().filter(|e| e.kind == ErrorKind::Shape).count();
    let mut output = format!(
        "{} problem(s): {} shape, {} rule\n",
        errors.len(),
        shapes,
        errors.len() - shapes
    );

    let width = errors.iter().map(|e| e.path.to_string().len()).max().unwrap_or(0);
    for error in errors.iter() {
        output.push_str(&report_entry(error, width));
    }
    output
}

fn report_entry(error: &ValidationError, width: usize) -> String {
    let mut entry = format!(
        "  {:<width$}  [{}] {}\n",
        error.path.to_string(),
        kind_label(error.kind),
        error.message,
        width = width
    );
    let indent = " ".repeat(width + 4);

    if let Some(input) = &error.input {
        entry.push_str(&format!("{}input: {}\n", indent, compact(input)));
    }
    for violation in &error.schema_violations {
        // Rule violations repeat the message as `actual`
        if violation.actual == error.message {
            entry.push_str(&format!("{}violated: {}\n", indent, violation.rule));
            continue;
        }
        entry.push_str(&format!(
            "{}{}: expected {}, got {}\n",
            indent, violation.rule, violation.expected, violation.actual
        ));
    }
    entry
}

/// Short rendering of an offending input; large containers are summarized
fn compact(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", s),
        Value::Array(items) if items.len() <= 3 => {
            format!("[{}]", items.iter().map(compact).collect::<Vec<_>>().join(", "))
        }
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(fields) if fields.len() <= 2 => {
            let fields: Vec<String> = fields.iter().map(|(k, v)| format!("{}: {}", k, compact(v))).collect();
            format!("{{{}}}", fields.join(", "))
        }
        Value::Object(fields) => format!("{{{} fields}}", fields.len()),
        other => other.to_string(),
    }
}
