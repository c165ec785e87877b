//! Configuration handling for the CSV file writer.
//!
//! The writer is configured with a single flat mapping. Keys starting with
//! `_` configure the writer itself (output path, encoding, append mode);
//! every other key is forwarded verbatim to the CSV renderer as a rendering
//! option. This module performs that partitioning, applies defaults and
//! resolves the output path against the process working directory.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::env;
use std::path::PathBuf;

/// Marker distinguishing the writer's own settings from pass-through
/// rendering options.
const OWN_SETTING_PREFIX: char = '_';

/// Text encoding used when persisting rendered CSV.
///
/// Rendered text is a Rust `String` and therefore UTF-8; only UTF-8 family
/// names are accepted. Anything else is rejected at construction rather than
/// silently mis-encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub enum Encoding {
    #[default]
    Utf8,
}

impl Encoding {
    /// Parses an encoding name, case-insensitively.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            other => bail!("unsupported encoding '{other}' (only UTF-8 is supported)"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        "utf8"
    }
}

/// The writer's own settings, built from the `_`-prefixed configuration keys.
///
/// # Fields
/// * `output_path` - Resolved output path, computed once at construction
/// * `encoding` - Text encoding for write/append (default: UTF-8)
/// * `append` - Append to an existing file instead of overwriting (default: false)
#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub output_path: PathBuf,
    pub encoding: Encoding,
    pub append: bool,
}

impl WriterConfig {
    /// Builds the writer settings from the own-settings half of a partitioned
    /// configuration (keys already stripped of their `_` prefix).
    ///
    /// A missing or non-string `path` is a hard error here, at construction
    /// time. A relative `path` is resolved against the current working
    /// directory; an absolute one is used as-is (`Path::join` semantics).
    pub fn from_settings(settings: &Map<String, Value>) -> Result<Self> {
        for key in settings.keys() {
            if !matches!(key.as_str(), "path" | "encoding" | "append") {
                bail!("unknown writer setting '_{key}'");
            }
        }

        let path = match settings.get("path") {
            Some(Value::String(p)) => p,
            Some(other) => bail!("'_path' must be a string, got {other}"),
            None => bail!("missing required '_path' setting"),
        };
        let cwd = env::current_dir().context("failed to determine working directory")?;
        let output_path = cwd.join(path);

        let encoding = match settings.get("encoding") {
            Some(Value::String(name)) => Encoding::parse(name)?,
            Some(other) => bail!("'_encoding' must be a string, got {other}"),
            None => Encoding::default(),
        };

        let append = match settings.get("append") {
            Some(Value::Bool(flag)) => *flag,
            Some(other) => bail!("'_append' must be a boolean, got {other}"),
            None => false,
        };

        Ok(WriterConfig {
            output_path,
            encoding,
            append,
        })
    }
}

/// Splits a flat configuration mapping into own settings and pass-through
/// rendering options.
///
/// # Returns
/// * `(settings, render_options)` - own settings with the `_` prefix stripped,
///   and every unprefixed key verbatim, both preserving insertion order
pub fn partition(config: &Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut settings = Map::new();
    let mut render_options = Map::new();

    for (key, value) in config {
        match key.strip_prefix(OWN_SETTING_PREFIX) {
            Some(stripped) => {
                settings.insert(stripped.to_string(), value.clone());
            }
            None => {
                render_options.insert(key.clone(), value.clone());
            }
        }
    }

    (settings, render_options)
}
