//! # pandoc-fold
//!
//! Turn Markdown, Jupyter notebooks and Word documents into a compact pandoc
//! JSON tree paired with document metadata, cached on disk for build tools.
//!
//! ## Why this crate?
//!
//! Pandoc's JSON output is faithful but bulky: every word and every space is
//! its own node, and running pandoc for every page on every build is slow.
//! This crate folds adjacent text leaves back together, extracts metadata
//! from timestamps and YAML header blocks, and caches the result per source
//! file until the source changes.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source path
//!  │
//!  ├─ 0. Cache     reuse <cache>/<flattened path>.json if newer than source
//!  ├─ A. Convert   pandoc -f <md|ipynb|docx> -t json, then fold text leaves
//!  ├─ B. Metadata  mtime, filename, YAML header block (concurrently with A)
//!  └─ 1. Output    { metadata, document } (+ html), written back to cache
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pandoc_fold::{convert, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder().cache_loc(".pandoc-cache").build()?;
//!     let output = convert("posts/hello.md", &config).await?;
//!     println!("{}", output.metadata.title().unwrap_or("untitled"));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pandoc-fold` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OutputFormat, PipelineConfig, PipelineConfigBuilder};
pub use convert::{
    convert, convert_for_output, convert_fresh, convert_sync, convert_with_status, module_for,
    parse_document, render_html, transform,
};
pub use error::FoldError;
pub use output::{CacheStatus, ConvertedDocument, Metadata, SourceMap, TransformOutput};
pub use pipeline::input::SourceFormat;
pub use pipeline::metadata::extract_metadata;
pub use pipeline::normalize::collapse_spaces;
pub use pipeline::pandoc::{DocumentConverter, PandocConverter};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_stream, DocumentStream, FileResult};
