//! Result types produced by the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder used for `title` and `date` until defaults are resolved.
pub(crate) const PLACEHOLDER: &str = "__placeholder";

/// Descriptive fields for one source document.
///
/// Backed by an ordered JSON object so header blocks can contribute fields of
/// any shape, and so the empty record `{}` is representable. When the record
/// is not empty it always holds `created`, `edited`, `filename`, `title` and
/// `date`, in that order, followed by any extra header fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    /// The empty record.
    pub fn empty() -> Self {
        Self(Map::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert or overwrite a field. Overwriting keeps the field's position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Overlay every field of `other`, `other` winning on collision.
    pub fn overlay(&mut self, other: Map<String, Value>) {
        for (k, v) in other {
            self.0.insert(k, v);
        }
    }

    pub fn created(&self) -> Option<&str> {
        self.get_str("created")
    }

    pub fn edited(&self) -> Option<&str> {
        self.get_str("edited")
    }

    pub fn filename(&self) -> Option<&str> {
        self.get_str("filename")
    }

    pub fn title(&self) -> Option<&str> {
        self.get_str("title")
    }

    pub fn date(&self) -> Option<&str> {
        self.get_str("date")
    }

    pub fn author(&self) -> Option<&str> {
        self.get_str("author")
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A converted document: metadata first, then the normalised pandoc tree.
///
/// This is also the on-disk cache format (without `html`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedDocument {
    pub metadata: Metadata,
    pub document: Value,
    /// Rendered HTML, only attached for [`crate::config::OutputFormat::Html`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl ConvertedDocument {
    pub fn new(metadata: Metadata, document: Value) -> Self {
        Self {
            metadata,
            document,
            html: None,
        }
    }
}

/// How a result was obtained with respect to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Served from a cache file newer than the source; converter not run.
    Hit,
    /// Computed fresh and written to the cache.
    Miss,
    /// No cache root configured; computed fresh, nothing written.
    Disabled,
}

/// What the build-tool transform hook hands back for a matching module id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformOutput {
    /// An ES module whose default export is the converted document.
    pub code: String,
    /// Source map; always empty because the module is generated.
    pub map: SourceMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMap {
    pub mappings: String,
}
