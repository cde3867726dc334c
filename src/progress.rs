//! Progress-callback trait for multi-file conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to hear about
//! each file as [`crate::stream::convert_stream`] works through a batch.
//!
//! # Example
//!
//! ```rust
//! use pandoc_fold::{ConversionProgressCallback, PipelineConfig};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, path: &Path, cache_hit: bool) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{} done (cached: {cache_hit})", path.display());
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the multi-file pipeline as it processes each document.
///
/// Files are converted concurrently, so `on_file_*` may be called from
/// several tasks at once. All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before any file is started.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    fn on_file_start(&self, path: &Path) {
        let _ = path;
    }

    /// `cache_hit` is true when the converter was not run.
    fn on_file_complete(&self, path: &Path, cache_hit: bool) {
        let _ = (path, cache_hit);
    }

    fn on_file_error(&self, path: &Path, error: String) {
        let _ = (path, error);
    }

    /// Called once after every file has finished or failed.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// Shared handle stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// A callback that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}
