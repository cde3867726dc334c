//! Converter client: drive pandoc as a subprocess.
//!
//! The pipeline never parses Markdown, notebooks or Word files itself. It
//! talks to a [`DocumentConverter`], and the production implementation,
//! [`PandocConverter`], runs
//!
//! ```text
//! pandoc [leading args] -f <from> -t <to>            (text on stdin)
//! pandoc [leading args] -f <from> -t <to> <path>     (file argument)
//! ```
//!
//! ## Protocol
//!
//! 1. The whole document plus a trailing newline is written to stdin, then
//!    stdin is closed so pandoc sees EOF.
//! 2. stdout is collected as the result while stdin is still being written,
//!    so a large document cannot deadlock on a full pipe.
//! 3. A non-zero exit is a [`FoldError::ConversionFailed`] carrying the exit
//!    code and stderr. stderr on a successful run is only logged.
//!
//! The process is spawned directly from an argument vector, never through a
//! shell, so paths containing quotes or `$` reach pandoc verbatim.
//!
//! There is no timeout: a started conversion runs until pandoc exits.

use crate::error::FoldError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Something that can convert documents between pandoc formats.
///
/// Implemented by [`PandocConverter`]; tests substitute an in-memory fake.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Convert `text` from format `from` to format `to`.
    async fn convert_text(&self, text: &str, from: &str, to: &str) -> Result<String, FoldError>;

    /// Convert the file at `path`, for formats that cannot be piped.
    async fn convert_file(&self, path: &Path, from: &str, to: &str) -> Result<String, FoldError>;
}

/// Subprocess client for the `pandoc` executable.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
    leading_args: Vec<String>,
}

impl Default for PandocConverter {
    fn default() -> Self {
        Self::new("pandoc")
    }
}

impl PandocConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Arguments placed before `-f <from> -t <to>` on every invocation.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, from: &str, to: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args(["-f", from, "-t", to])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> FoldError {
        FoldError::ConverterUnavailable {
            program: self.program.clone(),
            source,
        }
    }
}

#[async_trait]
impl DocumentConverter for PandocConverter {
    async fn convert_text(&self, text: &str, from: &str, to: &str) -> Result<String, FoldError> {
        debug!("{} -f {} -t {} ({} bytes on stdin)", self.program.display(), from, to, text.len());
        let mut child = self
            .command(from, to)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| FoldError::Internal("converter stdin was not captured".into()))?;

        let write = async move {
            stdin.write_all(text.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.shutdown().await
            // `stdin` dropped here: pandoc sees EOF.
        };

        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output.map_err(|e| self.spawn_error(e))?;
        let result = finish(output, from, None);
        // A converter that exits before reading all input breaks the pipe;
        // its exit status is the more useful signal.
        if let (Err(e), Ok(_)) = (&written, &result) {
            warn!("Converter closed stdin early: {}", e);
        }
        result
    }

    async fn convert_file(&self, path: &Path, from: &str, to: &str) -> Result<String, FoldError> {
        debug!("{} -f {} -t {} {}", self.program.display(), from, to, path.display());
        let output = self
            .command(from, to)
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;
        finish(output, from, Some(path))
    }
}

fn finish(
    output: std::process::Output,
    from: &str,
    path: Option<&Path>,
) -> Result<String, FoldError> {
    let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
    if !output.status.success() {
        warn!("Converter exited with {:?}: {}", output.status.code(), stderr);
        return Err(FoldError::ConversionFailed {
            path: path.map(Path::to_path_buf),
            format: from.to_string(),
            code: output.status.code(),
            stderr,
        });
    }
    if !stderr.is_empty() {
        warn!("Converter ({}) stderr: {}", from, stderr);
    }
    String::from_utf8(output.stdout).map_err(|source| FoldError::ConverterOutputEncoding {
        path: path.map(Path::to_path_buf),
        source,
    })
}
