//! On-disk result cache keyed by source path, invalidated by mtime.
//!
//! One pretty-printed JSON file per source lives under the cache root:
//!
//! ```text
//! posts/2024/hello.md  ──▶  <cache_root>/posts--2024--hello.md.json
//! ```
//!
//! An entry is reused only when its file is strictly newer than the source.
//! A missing or unreadable cache file counts as the Unix epoch, so it is
//! always stale.
//!
//! There is no locking. Two invocations for the same source may both miss
//! and both write; the last rename wins. Each writer fills its own temp file
//! in the cache root before renaming it over the entry, so racing writers
//! never share a file and a reader never sees a half-written entry.

use crate::error::FoldError;
use crate::output::{CacheStatus, ConvertedDocument};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Suffix appended to every cache file name.
pub const CACHE_SUFFIX: &str = ".json";
const FLATTENED_SEPARATOR: &str = "--";

/// Return the cached result for `source` when fresh, else run `compute` and
/// persist its output.
///
/// With `cache_root == None` caching is disabled: `compute` always runs and
/// nothing is written.
pub async fn get_or_compute<F, Fut>(
    cache_root: Option<&Path>,
    source: &Path,
    compute: F,
) -> Result<(ConvertedDocument, CacheStatus), FoldError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<ConvertedDocument, FoldError>>,
{
    let Some(root) = cache_root else {
        return Ok((compute().await?, CacheStatus::Disabled));
    };

    ensure_cache_dir(root).await?;
    let cache_path = cache_path(root, source);

    if is_fresh(&cache_path, source).await? {
        debug!("Cache hit: {}", cache_path.display());
        return Ok((read_entry(&cache_path).await?, CacheStatus::Hit));
    }

    debug!("Cache miss: {}", cache_path.display());
    let value = compute().await?;
    write_entry(&cache_path, &value).await?;
    Ok((value, CacheStatus::Miss))
}

/// Create the cache root, tolerating one that already exists.
pub async fn ensure_cache_dir(root: &Path) -> Result<(), FoldError> {
    match tokio::fs::create_dir(root).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(source) => Err(FoldError::CacheDir {
            path: root.to_path_buf(),
            source,
        }),
    }
}

/// Cache file for `source`: the source path flattened into one file name.
pub fn cache_path(root: &Path, source: &Path) -> PathBuf {
    root.join(format!("{}{}", flatten(source), CACHE_SUFFIX))
}

fn flatten(source: &Path) -> String {
    source
        .to_string_lossy()
        .replace(['/', '\\', ':'], FLATTENED_SEPARATOR)
}

/// Whether the cache file is strictly newer than the source.
async fn is_fresh(cache_path: &Path, source: &Path) -> Result<bool, FoldError> {
    let cached = mtime(cache_path).await.unwrap_or(UNIX_EPOCH);
    let source_time = mtime(source)
        .await
        .map_err(|e| FoldError::from_source_io(source, e))?;
    Ok(cached > source_time)
}

async fn mtime(path: &Path) -> std::io::Result<SystemTime> {
    tokio::fs::metadata(path).await?.modified()
}

async fn read_entry(path: &Path) -> Result<ConvertedDocument, FoldError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FoldError::CacheRead {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&text).map_err(|source| FoldError::CacheCorrupt {
        path: path.to_path_buf(),
        source,
    })
}

async fn write_entry(path: &Path, value: &ConvertedDocument) -> Result<(), FoldError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| FoldError::Internal(format!("serialise cache entry: {e}")))?;

    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || persist_atomically(&target, json.as_bytes()))
        .await
        .map_err(|e| FoldError::Internal(format!("cache writer panicked: {e}")))?
        .map_err(|source| FoldError::CacheWrite {
            path: path.to_path_buf(),
            source,
        })
}

/// Write to a uniquely named temp file beside `path`, then rename it into place.
///
/// The temp file is removed when the rename fails.
fn persist_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
