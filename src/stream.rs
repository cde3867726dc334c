//! Streaming multi-file API: emit each document as it completes.
//!
//! A site build usually converts dozens of documents. [`convert_stream`]
//! runs up to `config.concurrency` of them at once and yields results in
//! completion order, so callers can write output incrementally and drive a
//! progress bar. Each path is still an independent invocation of
//! [`crate::convert::convert_for_output`]: one failure does not affect the
//! other paths, and the only shared state is the cache directory.

use crate::config::PipelineConfig;
use crate::convert::convert_for_output;
use crate::error::FoldError;
use crate::output::{CacheStatus, ConvertedDocument};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::{info, warn};

/// One finished path and its outcome.
pub type FileResult = (PathBuf, Result<ConvertedDocument, FoldError>);

/// A boxed stream of per-path results.
pub type DocumentStream<'a> = Pin<Box<dyn Stream<Item = FileResult> + Send + 'a>>;

/// Convert several documents, streaming results as they are ready.
///
/// Duplicate paths are converted once. Progress events go to
/// `config.progress_callback`; `on_batch_complete` fires after the last item.
pub fn convert_stream<'a, I, P>(paths: I, config: &'a PipelineConfig) -> DocumentStream<'a>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let mut unique: Vec<PathBuf> = Vec::new();
    for p in paths.into_iter().map(Into::into) {
        if !unique.contains(&p) {
            unique.push(p);
        }
    }
    let total = unique.len();
    info!("Starting batch conversion of {} files", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
        if total == 0 {
            cb.on_batch_complete(0, 0);
        }
    }

    let succeeded = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));

    let results = stream::iter(unique.into_iter().map(move |path| {
        let succeeded = Arc::clone(&succeeded);
        let finished = Arc::clone(&finished);
        async move {
            if let Some(ref cb) = config.progress_callback {
                cb.on_file_start(&path);
            }
            let result = convert_for_output(&path, config).await;
            match &result {
                Ok((_, status)) => {
                    succeeded.fetch_add(1, Ordering::SeqCst);
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_file_complete(&path, *status == CacheStatus::Hit);
                    }
                }
                Err(e) => {
                    warn!("{}: {}", path.display(), e);
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_file_error(&path, e.to_string());
                    }
                }
            }
            if finished.fetch_add(1, Ordering::SeqCst) + 1 == total {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_batch_complete(total, succeeded.load(Ordering::SeqCst));
                }
            }
            (path, result.map(|(doc, _)| doc))
        }
    }))
    .buffer_unordered(config.concurrency.max(1));

    Box::pin(results)
}
