//! CSV text rendering.
//!
//! This module turns an ordered sequence of records into CSV text, driven by
//! the pass-through half of the writer configuration. Records are JSON
//! values: arrays of scalar fields, or objects whose fields are selected by
//! the `columns` option (inferred from the first record when not given).
//!
//! The option vocabulary is deliberately strict: an unknown option name or a
//! wrongly-typed value is an error, so a typo in a pipeline configuration
//! fails loudly instead of silently producing a malformed file.

use anyhow::{Context, Result, bail};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::{Map, Value};

/// Parsed rendering options.
///
/// # Fields
/// * `delimiter` - Field separator (default: `,`)
/// * `quote` - Quote character (default: `"`)
/// * `record_delimiter` - Record terminator (default: `\n`)
/// * `quoted` - Quote every field instead of only when necessary
/// * `header` - Emit a header row before the records
/// * `columns` - Column names: header labels and object-field selection order
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub delimiter: u8,
    pub quote: u8,
    pub record_delimiter: RecordDelimiter,
    pub quoted: bool,
    pub header: bool,
    pub columns: Option<Vec<String>>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            delimiter: b',',
            quote: b'"',
            record_delimiter: RecordDelimiter::Unix,
            quoted: false,
            header: false,
            columns: None,
        }
    }
}

/// Record terminator variants accepted by the `record_delimiter` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordDelimiter {
    Unix,
    Windows,
}

impl RecordDelimiter {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "\n" | "unix" => Ok(RecordDelimiter::Unix),
            "\r\n" | "windows" => Ok(RecordDelimiter::Windows),
            other => bail!("unsupported record_delimiter {other:?}"),
        }
    }

    fn terminator(&self) -> Terminator {
        match self {
            RecordDelimiter::Unix => Terminator::Any(b'\n'),
            RecordDelimiter::Windows => Terminator::CRLF,
        }
    }
}

impl RenderOptions {
    /// Parses rendering options from the unprefixed half of the writer
    /// configuration.
    pub fn from_map(options: &Map<String, Value>) -> Result<Self> {
        let mut parsed = RenderOptions::default();

        for (key, value) in options {
            match key.as_str() {
                "delimiter" => parsed.delimiter = single_byte(key, value)?,
                "quote" => parsed.quote = single_byte(key, value)?,
                "record_delimiter" => {
                    let Value::String(s) = value else {
                        bail!("option 'record_delimiter' must be a string, got {value}");
                    };
                    parsed.record_delimiter = RecordDelimiter::parse(s)?;
                }
                "quoted" => parsed.quoted = boolean(key, value)?,
                "header" => parsed.header = boolean(key, value)?,
                "columns" => {
                    let Value::Array(names) = value else {
                        bail!("option 'columns' must be an array, got {value}");
                    };
                    let mut columns = Vec::with_capacity(names.len());
                    for name in names {
                        let Value::String(name) = name else {
                            bail!("option 'columns' must contain only strings, got {name}");
                        };
                        columns.push(name.clone());
                    }
                    parsed.columns = Some(columns);
                }
                other => bail!("unknown rendering option '{other}'"),
            }
        }

        Ok(parsed)
    }
}

fn single_byte(key: &str, value: &Value) -> Result<u8> {
    let Value::String(s) = value else {
        bail!("option '{key}' must be a string, got {value}");
    };
    match s.as_bytes() {
        [byte] => Ok(*byte),
        _ => bail!("option '{key}' must be a single character, got {s:?}"),
    }
}

fn boolean(key: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        other => bail!("option '{key}' must be a boolean, got {other}"),
    }
}

/// Renders records to CSV text.
///
/// # Arguments
/// * `records` - The ordered record sequence taken from the result set
/// * `options` - Parsed rendering options controlling the output format
///
/// # Returns
/// * `Result<String>` - The rendered CSV text, or an error if a record or
///   field cannot be represented with the given options
pub fn render(records: &[Value], options: &RenderOptions) -> Result<String> {
    let columns = effective_columns(records, options);

    // With `quoted` set, fields are quoted here (empty fields excepted) and
    // the writer's own quoting is disabled; `QuoteStyle::Always` would quote
    // empty fields as well, which the upstream serializer does not.
    let mut buf = Vec::new();
    let mut writer = WriterBuilder::new()
        .delimiter(options.delimiter)
        .quote(options.quote)
        .terminator(options.record_delimiter.terminator())
        .quote_style(if options.quoted {
            QuoteStyle::Never
        } else {
            QuoteStyle::Necessary
        })
        .flexible(true)
        .from_writer(&mut buf);

    if options.header {
        let columns = columns
            .as_deref()
            .context("'header' requires 'columns' or object records")?;
        writer.write_record(quote_row(columns.to_vec(), options))?;
    }

    for record in records {
        match record {
            Value::Array(fields) => {
                let mut row = Vec::with_capacity(fields.len());
                for field in fields {
                    row.push(field_text(field)?);
                }
                writer.write_record(quote_row(row, options))?;
            }
            Value::Object(fields) => {
                let columns = columns
                    .as_deref()
                    .context("object records require 'columns'")?;
                let mut row = Vec::with_capacity(columns.len());
                for column in columns {
                    let field = fields.get(column).unwrap_or(&Value::Null);
                    row.push(field_text(field)?);
                }
                writer.write_record(quote_row(row, options))?;
            }
            other => bail!("record is not an array or object: {other}"),
        }
    }

    writer.flush()?;
    drop(writer);
    String::from_utf8(buf).context("rendered CSV is not valid UTF-8")
}

/// Columns actually in effect: the explicit `columns` option, or the first
/// object record's keys in insertion order.
fn effective_columns(records: &[Value], options: &RenderOptions) -> Option<Vec<String>> {
    if options.columns.is_some() {
        return options.columns.clone();
    }
    match records.first() {
        Some(Value::Object(fields)) => Some(fields.keys().cloned().collect()),
        _ => None,
    }
}

/// Applies the `quoted` option to a row: every non-empty field is wrapped in
/// the quote character, with embedded quotes doubled. Empty fields stay bare.
fn quote_row(row: Vec<String>, options: &RenderOptions) -> Vec<String> {
    if !options.quoted {
        return row;
    }
    let quote = options.quote as char;
    row.into_iter()
        .map(|field| {
            if field.is_empty() {
                return field;
            }
            let mut quoted = String::with_capacity(field.len() + 2);
            quoted.push(quote);
            for ch in field.chars() {
                if ch == quote {
                    quoted.push(quote);
                }
                quoted.push(ch);
            }
            quoted.push(quote);
            quoted
        })
        .collect()
}

/// Converts a scalar field to its CSV text form.
///
/// Matches the upstream serializer's conventions: strings verbatim, numbers
/// in decimal form, `true` as `1`, `false` and `null` as empty fields.
fn field_text(field: &Value) -> Result<String> {
    match field {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(true) => Ok("1".to_string()),
        Value::Bool(false) | Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => {
            bail!("field value is not a scalar: {field}")
        }
    }
}
