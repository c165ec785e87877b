//! Library crate for csv-sink
//!
//! A leaf pipeline processor that serializes tabular result sets to CSV
//! files. The writer is configured with a single flat mapping: `_`-prefixed
//! keys control the writer itself (path, encoding, append mode), all other
//! keys are forwarded verbatim to the CSV renderer.
//!
//! # Modules
//!
//! - [`config`]: Configuration partitioning, defaults and path resolution
//! - [`render`]: CSV text rendering and rendering-option parsing
//! - [`writer`]: The `CsvFileWriter` processor

pub mod config;
pub mod render;
pub mod writer;

pub use config::{Encoding, WriterConfig};
pub use render::RenderOptions;
pub use writer::{CsvFileWriter, ResultSet, RunInput, WriteOutcome};
