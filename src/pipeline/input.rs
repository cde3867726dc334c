//! Input resolution: map a source path to a pandoc reader and load its text.
//!
//! The set of formats is closed. Adding one means adding a variant here, and
//! the compiler then points at every `match` that needs a decision about it
//! (pipeable or not, header block or not).

use crate::error::FoldError;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// A source format the pipeline knows how to hand to pandoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// `.md`: pandoc markdown, may open with a YAML header block.
    Markdown,
    /// `.ipynb`: Jupyter notebook JSON.
    Ipynb,
    /// `.docx`: a zip container, so it is read by path rather than piped.
    Docx,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 3] = [Self::Markdown, Self::Ipynb, Self::Docx];

    /// Look up a format by file extension (case-sensitive, no leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "md" => Some(Self::Markdown),
            "ipynb" => Some(Self::Ipynb),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    /// Detect the format from the text after the path's last `.`.
    pub fn from_path(path: &Path) -> Result<Self, FoldError> {
        let ext = extension(path);
        Self::from_extension(ext).ok_or_else(|| FoldError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: ext.to_string(),
        })
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Ipynb => "ipynb",
            Self::Docx => "docx",
        }
    }

    /// Reader name passed to pandoc's `-f`.
    pub fn pandoc_name(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Ipynb => "ipynb",
            Self::Docx => "docx",
        }
    }

    /// Whether the document text can be streamed through stdin.
    pub fn is_pipeable(self) -> bool {
        !matches!(self, Self::Docx)
    }

    /// Whether the format may carry a YAML header block.
    pub fn supports_header(self) -> bool {
        matches!(self, Self::Markdown)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pandoc_name())
    }
}

/// Text after the last `.` of the whole path string (empty when absent).
fn extension(path: &Path) -> &str {
    let s = path.to_str().unwrap_or_default();
    s.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default()
}

/// Whether a module id is one the transform hook should handle.
///
/// Equivalent to matching `\.(md|ipynb|docx)$`.
pub fn is_supported(id: &str) -> bool {
    SourceFormat::ALL
        .iter()
        .any(|f| id.len() > f.extension().len() && id.ends_with(&format!(".{}", f.extension())))
}

/// Read a source file as UTF-8 text.
pub async fn read_source(path: &Path) -> Result<String, FoldError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| FoldError::from_source_io(path, e))?;
    debug!("Read {} bytes from {}", text.len(), path.display());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_known_extensions() {
        assert_eq!(
            SourceFormat::from_path(Path::new("notes/a.md")).unwrap(),
            SourceFormat::Markdown
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("nb.ipynb")).unwrap(),
            SourceFormat::Ipynb
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("Have you always wanted to blog in Word.docx"))
                .unwrap(),
            SourceFormat::Docx
        );
    }

    #[test]
    fn extension_is_case_sensitive() {
        assert!(matches!(
            SourceFormat::from_path(Path::new("README.MD")),
            Err(FoldError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn missing_extension_is_unsupported() {
        match SourceFormat::from_path(Path::new("Makefile")) {
            Err(FoldError::UnsupportedFormat { extension, .. }) => assert_eq!(extension, ""),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn only_docx_is_not_pipeable() {
        assert!(SourceFormat::Markdown.is_pipeable());
        assert!(SourceFormat::Ipynb.is_pipeable());
        assert!(!SourceFormat::Docx.is_pipeable());
    }

    #[test]
    fn only_markdown_has_headers() {
        assert!(SourceFormat::Markdown.supports_header());
        assert!(!SourceFormat::Ipynb.supports_header());
        assert!(!SourceFormat::Docx.supports_header());
    }

    #[test]
    fn transform_filter_matches_suffixes() {
        assert!(is_supported("/src/posts/hello.md"));
        assert!(is_supported("book.ipynb"));
        assert!(is_supported("letter.docx"));
        assert!(!is_supported("style.css"));
        assert!(!is_supported("hello.md.js"));
        assert!(!is_supported(".md"));
    }

    #[tokio::test]
    async fn read_missing_source_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_source(&dir.path().join("nope.md")).await.unwrap_err();
        assert!(matches!(err, FoldError::FileNotFound { .. }));
    }
}
