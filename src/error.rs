//! Error type for the pandoc-fold library.
//!
//! Every failure is fatal for the source path being processed: a caller gets
//! either a complete `{ metadata, document }` pair or a [`FoldError`], never a
//! half-filled result. Each variant names the path (or program) involved and
//! the phase that failed, so a build log line is enough to start debugging.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// All errors returned by the pandoc-fold library.
#[derive(Debug, Error)]
pub enum FoldError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Source file was not found at the given path.
    #[error("Source file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading or stat-ing the source.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file extension does not map to a known source format.
    #[error("Unsupported source format '{extension}' for '{path}'\nSupported extensions: md, ipynb, docx")]
    UnsupportedFormat { path: PathBuf, extension: String },

    // ── Converter errors ──────────────────────────────────────────────────
    /// The converter executable could not be started.
    #[error("Failed to start converter '{program}': {source}\nIs pandoc installed and on PATH? Override with --pandoc.")]
    ConverterUnavailable {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The converter exited with a non-zero status.
    ///
    /// `code` is `None` when the process was terminated by a signal. `path`
    /// is `None` only while the error is still inside a converter fed on
    /// stdin; the orchestrator fills it in before returning.
    #[error(
        "Converter failed on {} ({format}) with exit code {}: {stderr}",
        display_path(.path),
        display_code(.code)
    )]
    ConversionFailed {
        path: Option<PathBuf>,
        format: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The converter succeeded but wrote bytes that are not UTF-8.
    #[error("Converter output for {} is not UTF-8: {source}", display_path(.path))]
    ConverterOutputEncoding {
        path: Option<PathBuf>,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// The converter succeeded but its output is not a JSON tree.
    #[error("Converter output for '{path}' is not valid JSON: {source}")]
    InvalidConverterOutput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ── Metadata errors ───────────────────────────────────────────────────
    /// The header block is present but is not valid YAML.
    #[error("Malformed header block in '{path}': {source}")]
    MetadataParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The header block parsed, but not to a key/value mapping.
    #[error("Header block in '{path}' must be a key/value mapping, got {found}")]
    InvalidHeader { path: PathBuf, found: &'static str },

    // ── Cache errors ──────────────────────────────────────────────────────
    /// The cache root could not be created.
    #[error("Failed to create cache directory '{path}': {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A valid cache file exists but could not be read.
    #[error("Failed to read cache file '{path}': {source}")]
    CacheRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A valid cache file exists but does not hold a cached document.
    #[error("Cache file '{path}' is corrupt: {source}\nDelete it to force a fresh conversion.")]
    CacheCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The fresh result could not be persisted.
    #[error("Failed to write cache file '{path}': {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "<signal>".to_string(),
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!("'{}'", p.display()),
        None => "<stdin>".to_string(),
    }
}

impl FoldError {
    /// Attach the source path to converter errors that were raised without one.
    pub(crate) fn at_source(self, source: &Path) -> Self {
        match self {
            FoldError::ConversionFailed {
                path: None,
                format,
                code,
                stderr,
            } => FoldError::ConversionFailed {
                path: Some(source.to_path_buf()),
                format,
                code,
                stderr,
            },
            FoldError::ConverterOutputEncoding { path: None, source: e } => {
                FoldError::ConverterOutputEncoding {
                    path: Some(source.to_path_buf()),
                    source: e,
                }
            }
            other => other,
        }
    }

    /// Map an I/O error on the source file to the most specific variant.
    pub(crate) fn from_source_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => FoldError::FileNotFound { path },
            std::io::ErrorKind::PermissionDenied => FoldError::PermissionDenied { path },
            _ => FoldError::ReadFailed { path, source: err },
        }
    }
}
