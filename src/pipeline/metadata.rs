//! Metadata extraction from file timestamps and YAML header blocks.
//!
//! Every document gets `created`, `edited`, `filename`, `title` and `date`.
//! Markdown may additionally open with a header block:
//!
//! ```text
//! ---
//! title: Foo
//! author: Jane
//! ---            (or "...")
//! body text
//! ```
//!
//! Header fields overlay the defaults. `title` and `date` start as a
//! placeholder and fall back to `filename` and `created` when the header
//! does not set them.
//!
//! A Markdown file that does *not* open with `---\n` yields the empty
//! record, defaults included. Downstream consumers rely on that to tell
//! "no front matter" apart from "front matter with defaults".

use crate::error::FoldError;
use crate::output::{Metadata, PLACEHOLDER};
use crate::pipeline::input::{read_source, SourceFormat};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;

const OPENING_DELIMITER: &str = "---\n";
const DASH_DELIMITER: &str = "---";
const DOT_DELIMITER: &str = "...";
/// A candidate this close to the document length means no closing delimiter.
const MIN_TRAILING_CHARS: usize = 5;

/// Extract metadata for the source at `path`.
///
/// # Errors
/// - [`FoldError::FileNotFound`] and friends when the file cannot be stat-ed or read
/// - [`FoldError::UnsupportedFormat`] for unknown extensions
/// - [`FoldError::MetadataParse`] / [`FoldError::InvalidHeader`] for a bad header block
pub async fn extract_metadata(path: &Path) -> Result<Metadata, FoldError> {
    let format = SourceFormat::from_path(path)?;
    let stat = tokio::fs::metadata(path)
        .await
        .map_err(|e| FoldError::from_source_io(path, e))?;
    let modified = stat
        .modified()
        .map_err(|e| FoldError::from_source_io(path, e))?;

    let mut meta = defaults(path, modified);

    if format.supports_header() {
        let raw = read_source(path).await?;
        match header_block(&raw) {
            Some(header) => meta.overlay(parse_header(path, header)?),
            None => {
                debug!("No header block in {}", path.display());
                return Ok(Metadata::empty());
            }
        }
    }

    resolve_placeholders(&mut meta);
    Ok(meta)
}

/// Default record before any header overlay.
pub fn defaults(path: &Path, modified: SystemTime) -> Metadata {
    let stamp = iso_timestamp(modified);
    let mut meta = Metadata::empty();
    meta.insert("created", Value::String(stamp.clone()));
    meta.insert("edited", Value::String(stamp));
    meta.insert("filename", Value::String(file_stem(path)));
    meta.insert("title", Value::String(PLACEHOLDER.to_string()));
    meta.insert("date", Value::String(PLACEHOLDER.to_string()));
    meta
}

/// `2024-03-01T09:30:00.000Z`
pub fn iso_timestamp(t: SystemTime) -> String {
    DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Locate the header block text, between the opening delimiter and the
/// nearer of the two closing delimiters.
///
/// Returns `None` when the document does not open with `---\n` or when no
/// closing delimiter bounds the block.
pub fn header_block(raw: &str) -> Option<&str> {
    let rest = raw.strip_prefix(OPENING_DELIMITER)?;

    let by_dashes = until(rest, DASH_DELIMITER);
    let by_dots = until(rest, DOT_DELIMITER);
    let candidate = if by_dots.len() < by_dashes.len() {
        by_dots
    } else {
        by_dashes
    };

    ends_before_document(candidate.chars().count(), raw.chars().count()).then_some(candidate)
}

/// A header candidate counts only when it stops short of the last
/// [`MIN_TRAILING_CHARS`] characters of the document.
fn ends_before_document(candidate_chars: usize, doc_chars: usize) -> bool {
    candidate_chars < doc_chars.saturating_sub(MIN_TRAILING_CHARS)
}

fn until<'a>(text: &'a str, delimiter: &str) -> &'a str {
    text.split_once(delimiter).map_or(text, |(head, _)| head)
}

fn parse_header(path: &Path, header: &str) -> Result<Map<String, Value>, FoldError> {
    if header.trim().is_empty() {
        return Ok(Map::new());
    }
    let parsed: Value =
        serde_yaml::from_str(header).map_err(|source| FoldError::MetadataParse {
            path: path.to_path_buf(),
            source,
        })?;
    match parsed {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(FoldError::InvalidHeader {
            path: path.to_path_buf(),
            found: kind_of(&other),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

fn resolve_placeholders(meta: &mut Metadata) {
    if meta.title() == Some(PLACEHOLDER) {
        let filename = meta.get("filename").cloned().unwrap_or(Value::Null);
        meta.insert("title", filename);
    }
    if meta.date() == Some(PLACEHOLDER) {
        let created = meta.get("created").cloned().unwrap_or(Value::Null);
        meta.insert("date", created);
    }
}
