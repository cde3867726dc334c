//! Configuration types for document conversion.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. The defaults mirror what a build-tool
//! plugin gets when it passes no options: no cache, JSON output, `pandoc`
//! from `PATH`.

use crate::error::FoldError;
use crate::pipeline::pandoc::{DocumentConverter, PandocConverter};
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Configuration for converting one or more source documents.
///
/// # Example
/// ```rust
/// use pandoc_fold::{OutputFormat, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .cache_loc(".cache/pandoc")
///     .format(OutputFormat::Html)
///     .build()
///     .unwrap();
/// assert!(config.cache_loc.is_some());
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Cache root. `None` disables caching entirely. Default: `None`.
    pub cache_loc: Option<PathBuf>,

    /// What the transform surface emits. Default: [`OutputFormat::Json`].
    pub format: OutputFormat,

    /// Converter executable. Default: `"pandoc"`.
    pub pandoc_path: PathBuf,

    /// Arguments inserted before `-f/-t` on every converter call. Default: none.
    pub pandoc_args: Vec<String>,

    /// Pre-constructed converter. Takes precedence over `pandoc_path`.
    pub converter: Option<Arc<dyn DocumentConverter>>,

    /// Maximum number of documents converted at once by
    /// [`crate::stream::convert_stream`]. Default: 4.
    ///
    /// Each document costs one pandoc process, which is CPU-bound; a small
    /// number keeps a laptop responsive during a site build.
    pub concurrency: usize,

    /// Optional per-file progress events for multi-file runs.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cache_loc: None,
            format: OutputFormat::default(),
            pandoc_path: PathBuf::from("pandoc"),
            pandoc_args: Vec::new(),
            converter: None,
            concurrency: 4,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("cache_loc", &self.cache_loc)
            .field("format", &self.format)
            .field("pandoc_path", &self.pandoc_path)
            .field("pandoc_args", &self.pandoc_args)
            .field(
                "converter",
                &self.converter.as_ref().map(|_| "<dyn DocumentConverter>"),
            )
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// The converter this configuration selects.
    ///
    /// An injected converter wins; otherwise a [`PandocConverter`] is built
    /// from `pandoc_path` and `pandoc_args`.
    pub fn resolve_converter(&self) -> Arc<dyn DocumentConverter> {
        match self.converter {
            Some(ref converter) => Arc::clone(converter),
            None => Arc::new(
                PandocConverter::new(&self.pandoc_path).with_args(self.pandoc_args.iter().cloned()),
            ),
        }
    }
}

/// Builder for [`PipelineConfig`].
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl fmt::Debug for PipelineConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl PipelineConfigBuilder {
    pub fn cache_loc(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_loc = Some(dir.into());
        self
    }

    pub fn no_cache(mut self) -> Self {
        self.config.cache_loc = None;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn pandoc_path(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.pandoc_path = program.into();
        self
    }

    pub fn pandoc_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.pandoc_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn converter(mut self, converter: Arc<dyn DocumentConverter>) -> Self {
        self.config.converter = Some(converter);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, FoldError> {
        let c = &self.config;
        if c.pandoc_path.as_os_str().is_empty() {
            return Err(FoldError::InvalidConfig(
                "converter path must not be empty".into(),
            ));
        }
        if c.cache_loc.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            return Err(FoldError::InvalidConfig(
                "cache location must not be empty; omit it to disable caching".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(FoldError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What a converted document is emitted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Normalised pandoc JSON tree plus metadata. (default)
    #[default]
    Json,
    /// As `Json`, with the tree also rendered to HTML under `html`.
    Html,
}

impl FromStr for OutputFormat {
    type Err = FoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "html" => Ok(Self::Html),
            other => Err(FoldError::InvalidConfig(format!(
                "unknown output format '{other}' (expected 'json' or 'html')"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Html => "html",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_plugin_defaults() {
        let c = PipelineConfig::default();
        assert!(c.cache_loc.is_none());
        assert_eq!(c.format, OutputFormat::Json);
        assert_eq!(c.pandoc_path, PathBuf::from("pandoc"));
        assert_eq!(c.concurrency, 4);
    }

    #[test]
    fn no_cache_clears_earlier_cache_loc() {
        let c = PipelineConfig::builder()
            .cache_loc("cache")
            .no_cache()
            .build()
            .unwrap();
        assert!(c.cache_loc.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let c = PipelineConfig::builder()
            .cache_loc("cache")
            .format(OutputFormat::Html)
            .pandoc_path("/opt/pandoc/bin/pandoc")
            .pandoc_args(["--quiet"])
            .concurrency(0)
            .build()
            .unwrap();
        assert_eq!(c.cache_loc, Some(PathBuf::from("cache")));
        assert_eq!(c.format, OutputFormat::Html);
        assert_eq!(c.pandoc_args, vec!["--quiet".to_string()]);
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn empty_cache_loc_is_rejected() {
        let err = PipelineConfig::builder().cache_loc("").build().unwrap_err();
        assert!(matches!(err, FoldError::InvalidConfig(_)));
    }

    #[test]
    fn empty_pandoc_path_is_rejected() {
        let err = PipelineConfig::builder().pandoc_path("").build().unwrap_err();
        assert!(matches!(err, FoldError::InvalidConfig(_)));
    }

    #[test]
    fn output_format_parses() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("HTML".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert!("pdf".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn debug_hides_converter() {
        let c = PipelineConfig::builder()
            .converter(Arc::new(PandocConverter::default()))
            .build()
            .unwrap();
        assert!(format!("{c:?}").contains("<dyn DocumentConverter>"));
    }
}
