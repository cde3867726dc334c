//! Per-path conversion entry points.
//!
//! ```text
//!            ┌─ A: dispatch on extension ─▶ pandoc ─▶ parse JSON ─▶ normalise ─┐
//! path ──────┤                                                                 ├─▶ { metadata, document }
//!            └─ B: stat + header block ──────────────────────────▶ metadata ──┘
//! ```
//!
//! Branches A and B run concurrently and are joined with `try_join!`, so the
//! first failure aborts the whole invocation. The join is wrapped by the
//! cache: on a fresh entry neither branch runs.

use crate::cache;
use crate::config::{OutputFormat, PipelineConfig};
use crate::error::FoldError;
use crate::output::{CacheStatus, ConvertedDocument, SourceMap, TransformOutput};
use crate::pipeline::input::{self, SourceFormat};
use crate::pipeline::metadata::extract_metadata;
use crate::pipeline::normalize::collapse_spaces;
use crate::pipeline::pandoc::DocumentConverter;
use serde_json::Value;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a source document to `{ metadata, document }`.
///
/// This is the primary entry point for the library. With
/// `config.cache_loc` set, a cache entry newer than the source is returned
/// without running the converter.
///
/// # Errors
/// Any failure aborts the whole conversion; nothing partial is returned:
/// - unknown extension, unreadable source
/// - converter missing or exiting non-zero
/// - malformed header block
/// - cache directory or cache file I/O
pub async fn convert(
    path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<ConvertedDocument, FoldError> {
    convert_with_status(path, config).await.map(|(doc, _)| doc)
}

/// Like [`convert`], also reporting whether the cache was used.
pub async fn convert_with_status(
    path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<(ConvertedDocument, CacheStatus), FoldError> {
    let path = path.as_ref();
    let start = Instant::now();
    info!("Starting conversion: {}", path.display());

    let converter = config.resolve_converter();
    let (doc, status) = cache::get_or_compute(config.cache_loc.as_deref(), path, || {
        convert_fresh(converter.as_ref(), path)
    })
    .await?;

    info!(
        "Conversion complete: {} ({:?}, {}ms)",
        path.display(),
        status,
        start.elapsed().as_millis()
    );
    Ok((doc, status))
}

/// Run both branches without consulting the cache.
pub async fn convert_fresh(
    converter: &dyn DocumentConverter,
    path: &Path,
) -> Result<ConvertedDocument, FoldError> {
    let (document, metadata) =
        tokio::try_join!(parse_document(converter, path), extract_metadata(path))?;
    Ok(ConvertedDocument::new(metadata, document))
}

/// Branch A: convert the source to a pandoc JSON tree and normalise it.
pub async fn parse_document(
    converter: &dyn DocumentConverter,
    path: &Path,
) -> Result<Value, FoldError> {
    let format = SourceFormat::from_path(path)?;
    debug!("Dispatching {} as {}", path.display(), format);

    let raw = if format.is_pipeable() {
        let text = input::read_source(path).await?;
        converter
            .convert_text(&text, format.pandoc_name(), "json")
            .await
    } else {
        // Zip containers cannot be piped; pandoc reads the file itself.
        converter
            .convert_file(path, format.pandoc_name(), "json")
            .await
    }
    .map_err(|e| e.at_source(path))?;

    let tree: Value =
        serde_json::from_str(&raw).map_err(|source| FoldError::InvalidConverterOutput {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(collapse_spaces(&tree))
}

/// Render a pandoc JSON tree to HTML through the converter.
pub async fn render_html(
    converter: &dyn DocumentConverter,
    document: &Value,
) -> Result<String, FoldError> {
    let json = serde_json::to_string(document)
        .map_err(|e| FoldError::Internal(format!("serialise document: {e}")))?;
    converter.convert_text(&json, "json", "html").await
}

/// Convert and, for [`OutputFormat::Html`], attach the rendered HTML.
pub async fn convert_for_output(
    path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<(ConvertedDocument, CacheStatus), FoldError> {
    let path = path.as_ref();
    let (mut doc, status) = convert_with_status(path, config).await?;
    if config.format == OutputFormat::Html {
        let converter = config.resolve_converter();
        let html = render_html(converter.as_ref(), &doc.document)
            .await
            .map_err(|e| e.at_source(path))?;
        doc.html = Some(html);
    }
    Ok((doc, status))
}

/// Build-tool transform hook.
///
/// Returns `Ok(None)` for module ids that are not `.md`, `.ipynb` or
/// `.docx`. Matching ids become an ES module exporting the converted
/// document.
pub async fn transform(
    id: &str,
    config: &PipelineConfig,
) -> Result<Option<TransformOutput>, FoldError> {
    if !input::is_supported(id) {
        return Ok(None);
    }
    let (doc, _) = convert_for_output(id, config).await?;
    Ok(Some(module_for(&doc)?))
}

/// `export default {...};` for a converted document.
pub fn module_for(doc: &ConvertedDocument) -> Result<TransformOutput, FoldError> {
    let json = serde_json::to_string(doc)
        .map_err(|e| FoldError::Internal(format!("serialise document: {e}")))?;
    Ok(TransformOutput {
        code: format!("export default {json};"),
        map: SourceMap::default(),
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<ConvertedDocument, FoldError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| FoldError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(path, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Metadata;
    use serde_json::json;

    #[test]
    fn module_wraps_json_as_default_export() {
        let doc = ConvertedDocument::new(Metadata::empty(), json!({"blocks": []}));
        let out = module_for(&doc).unwrap();
        assert_eq!(
            out.code,
            r#"export default {"metadata":{},"document":{"blocks":[]}};"#
        );
        assert_eq!(out.map.mappings, "");
    }

    #[test]
    fn module_includes_html_when_present() {
        let mut doc = ConvertedDocument::new(Metadata::empty(), json!([]));
        doc.html = Some("<p>x</p>".into());
        let out = module_for(&doc).unwrap();
        assert!(out.code.ends_with(r#","html":"<p>x</p>"};"#), "{}", out.code);
    }
}
