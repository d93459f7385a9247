//! Rendering for every `fri` command.
//!
//! A command builds one serializable report and hands it over together with
//! a human renderer. JSON goes through `serde_json`; pretty and text go to
//! the renderer. Errors go to stderr in the same mode.
//!
//! The mode comes from `--format`, then the hidden `--json`, then the
//! `FORMAT` env var, then the terminal: pretty on a TTY, text when piped.

use clap::ValueEnum;
use frindex_core::error::{ErrorCode, IndexError};
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

const RULE_WIDTH: usize = 72;
const KEY_WIDTH: usize = 18;

pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{}", "-".repeat(RULE_WIDTH))
}

/// Heading line underlined by a rule.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// `key:` padded to a fixed column, then the value.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    let label = format!("{key}:");
    writeln!(w, "{label:<KEY_WIDTH$} {}", value.as_ref())
}

pub const fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Sections and indented groupings for reading in a terminal.
    Pretty,
    /// One tab-separated row per record.
    Text,
    Json,
}

impl OutputMode {
    /// Parse a `FORMAT` value; unknown values are ignored.
    fn from_env_value(raw: &str) -> Option<Self> {
        Self::from_str(raw.trim(), true).ok()
    }
}

fn pick_output_mode(
    flag: Option<OutputMode>,
    json: bool,
    env: Option<&str>,
    stdout_is_tty: bool,
) -> OutputMode {
    flag.or_else(|| json.then_some(OutputMode::Json))
        .or_else(|| env.and_then(OutputMode::from_env_value))
        .unwrap_or(if stdout_is_tty {
            OutputMode::Pretty
        } else {
            OutputMode::Text
        })
}

pub fn resolve_output_mode(flag: Option<OutputMode>, json: bool) -> OutputMode {
    let env = std::env::var("FORMAT").ok();
    pick_output_mode(flag, json, env.as_deref(), io::stdout().is_terminal())
}

fn write_json<T: Serialize>(out: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Print `value` to stdout with separate text and pretty renderers.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    match mode {
        OutputMode::Json => write_json(&mut out, value)?,
        OutputMode::Text => text(value, &mut out)?,
        OutputMode::Pretty => pretty(value, &mut out)?,
    }
    Ok(())
}

/// Like [`render_mode`] for reports whose text and pretty forms coincide.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    if mode == OutputMode::Json {
        write_json(&mut out, value)
    } else {
        human(value, &mut out)?;
        Ok(())
    }
}

/// What a failed command prints: a message, plus an `E####` code and a hint
/// when the failure is a known one.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_code: None,
            suggestion: None,
        }
    }

    pub fn coded(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_code: Some(code.code().to_string()),
            suggestion: code.hint().map(str::to_string),
        }
    }
}

impl From<&IndexError> for CliError {
    fn from(err: &IndexError) -> Self {
        Self::coded(err.error_code(), err.to_string())
    }
}

/// Write `error` to stderr.
///
/// # Errors
///
/// Returns an error if stderr cannot be written.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let mut err = io::stderr().lock();
    if mode == OutputMode::Json {
        return write_json(&mut err, &serde_json::json!({ "error": error }));
    }

    let tag = error
        .error_code
        .as_deref()
        .map_or_else(|| "error".to_string(), |code| format!("error[{code}]"));
    writeln!(err, "{tag}: {}", error.message)?;
    if let Some(hint) = &error.suggestion {
        writeln!(err, "  suggestion: {hint}")?;
    }
    Ok(())
}

/// Report `error` and return it as the command's failure.
pub fn fail(mode: OutputMode, error: &CliError) -> anyhow::Error {
    match render_error(mode, error) {
        Ok(()) => anyhow::anyhow!("{}", error.message),
        Err(write_err) => write_err,
    }
}
