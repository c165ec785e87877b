//! The CSV file-writer pipeline processor.
//!
//! `CsvFileWriter` is a leaf processor: it receives the result set produced
//! by the previous pipeline stage, renders the records under the result
//! set's first key to CSV text, and persists that text to the configured
//! path. It holds no mutable state, so a single instance may serve
//! concurrent invocations; writes to the same path are not coordinated.

use crate::config::{self, WriterConfig};
use crate::render::{self, RenderOptions};
use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// A result set: one entry per root key, each holding an ordered sequence of
/// records. Only the first entry is written.
pub type ResultSet = Map<String, Value>;

/// Input to a single pipeline invocation.
///
/// # Fields
/// * `results` - The results from the previous processor, if any
/// * `parse_results` - The original parse results, carried for compatibility
///   with other processors and never read here
#[derive(Debug, Default)]
pub struct RunInput {
    pub results: Option<ResultSet>,
    pub parse_results: Option<Value>,
}

impl RunInput {
    pub fn from_results(results: ResultSet) -> Self {
        RunInput {
            results: Some(results),
            parse_results: None,
        }
    }
}

/// Successful outcome of a write: the results echoed unchanged for the next
/// stage, plus the path the file was written to.
#[derive(Debug, serde::Serialize)]
pub struct WriteOutcome {
    pub results: ResultSet,
    pub file_path: PathBuf,
}

/// Writes result sets to a CSV file.
///
/// Configured once with a flat mapping: `_`-prefixed keys are the writer's
/// own settings, everything else is forwarded to the renderer. See
/// [`crate::config`] for the recognized settings and [`crate::render`] for
/// the rendering options.
#[derive(Debug)]
pub struct CsvFileWriter {
    config: WriterConfig,
    render_options: RenderOptions,
}

impl CsvFileWriter {
    /// Creates a writer from a flat configuration mapping.
    ///
    /// Partitions the mapping, applies defaults and resolves the output path
    /// against the current working directory. Fails on a missing `_path`, an
    /// unsupported `_encoding`, or an invalid rendering option; performs no
    /// I/O.
    pub fn new(config: &Map<String, Value>) -> Result<Self> {
        let (settings, options) = config::partition(config);
        let config = WriterConfig::from_settings(&settings)?;
        let render_options = RenderOptions::from_map(&options)?;

        debug!(?config, ?render_options, "CsvFileWriter instance created");

        Ok(CsvFileWriter {
            config,
            render_options,
        })
    }

    /// The resolved output path this writer persists to.
    pub fn output_path(&self) -> &std::path::Path {
        &self.config.output_path
    }

    /// Renders the result set to CSV and writes it to the configured path.
    ///
    /// An absent result set is a defined short-circuit: nothing is rendered,
    /// nothing is written and `Ok(None)` is returned. Otherwise the records
    /// under the result set's first key are rendered and persisted, and the
    /// outcome echoes the results unchanged together with the output path.
    ///
    /// Rendering and I/O errors propagate to the caller as-is; a rendering
    /// error aborts the invocation before any file is touched.
    pub fn run(&self, input: RunInput) -> Result<Option<WriteOutcome>> {
        let Some(results) = input.results else {
            debug!("no results to write");
            return Ok(None);
        };

        let Some((root_key, lines)) = results.iter().next() else {
            bail!("result set has no root key");
        };
        let Value::Array(lines) = lines else {
            bail!("'{root_key}' is not an ordered sequence of records");
        };

        debug!(
            lines = lines.len(),
            encoding = self.config.encoding.as_str(),
            path = %self.config.output_path.display(),
            "writing CSV file"
        );

        let text = render::render(lines, &self.render_options)?;
        self.persist(&text)?;

        debug!(bytes = text.len(), "wrote CSV file");

        let file_path = self.config.output_path.clone();
        Ok(Some(WriteOutcome { results, file_path }))
    }

    /// Persists rendered text at the output path, appending or overwriting
    /// per the configuration. The encoding is validated at construction and
    /// is always UTF-8, which the rendered `String` already is.
    fn persist(&self, text: &str) -> Result<()> {
        let path = &self.config.output_path;
        if self.config.append {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open {} for append", path.display()))?;
            file.write_all(text.as_bytes())
                .with_context(|| format!("failed to append to {}", path.display()))?;
        } else {
            fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        Ok(())
    }
}
