//! `rulegen.conf` configuration file parser.
//!
//! | Directive | Action |
//! |-----------|--------|
//! | `/function <name> [<name>…]` | declare known rule functions |
//! | `/set strict=<bool>` or `/set strict <bool>` | reject calls to unknown functions |
//! | `/set log=<level>` | default log level (`error` … `trace`) |
//! | Lines starting with `;` | comment, ignored |
//! | Any other `/command` | silently skipped |

use std::collections::BTreeSet;
use std::path::Path;

use thiserror::Error;

use crate::template::call::is_call_name;

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

/// Parsed rulegen configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Names of the functions rule actions may call.
    pub functions: BTreeSet<String>,
    /// Reject calls to functions not in `functions`.
    pub strict: bool,
    /// Log level requested by the file, if any.
    pub log_level: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config string.
    ///
    /// Returns the config and a list of errors on recognised lines; a bad
    /// line never stops the rest of the file from loading.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let Some(rest) = line.strip_prefix('/') else { continue };

            let (cmd, args_str) = rest
                .split_once(|c: char| c.is_ascii_whitespace())
                .unwrap_or((rest, ""));
            let tokens: Vec<&str> = args_str.split_whitespace().collect();

            let result = match cmd {
                "function" => parse_function(&tokens, &mut config),
                "set" => parse_set(&tokens, &mut config),
                _ => Ok(()),
            };
            if let Err(message) = result {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        (config, errors)
    }

    /// Read and parse a config file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }
}

// ── /function ─────────────────────────────────────────────────────────────────

fn parse_function(tokens: &[&str], config: &mut Config) -> Result<(), String> {
    if tokens.is_empty() {
        return Err("/function: requires at least one name".into());
    }
    if let Some(bad) = tokens.iter().find(|t| !is_call_name(t)) {
        return Err(format!("/function: invalid function name '{bad}'"));
    }
    config.functions.extend(tokens.iter().map(|t| (*t).to_owned()));
    Ok(())
}

// ── /set ─────────────────────────────────────────────────────────────────────

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Parse `/set <name>=<value>` or `/set <name> <value>`.
fn parse_set(tokens: &[&str], config: &mut Config) -> Result<(), String> {
    let Some(first) = tokens.first() else {
        return Err("/set: requires an argument".into());
    };

    let (name, value) = if let Some((name, value)) = first.split_once('=') {
        (name.to_owned(), value.to_owned())
    } else if tokens.len() >= 2 {
        ((*first).to_owned(), tokens[1..].join(" "))
    } else {
        return Err(format!("/set: missing value for '{first}'"));
    };

    match name.as_str() {
        "strict" => config.strict = parse_bool(&value)?,
        "log" => {
            let level = value.to_ascii_lowercase();
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(format!("/set: unknown log level '{value}'"));
            }
            config.log_level = Some(level);
        }
        "" => return Err("/set: variable name cannot be empty".into()),
        other => return Err(format!("/set: unknown setting '{other}'")),
    }
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "on" | "yes" | "true" => Ok(true),
        "0" | "off" | "no" | "false" => Ok(false),
        _ => Err(format!("/set: expected a boolean, got '{value}'")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
