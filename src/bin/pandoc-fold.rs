//! CLI binary for pandoc-fold.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PipelineConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use pandoc_fold::{
    convert_for_output, convert_stream, module_for, ConversionProgressCallback,
    ConvertedDocument, OutputFormat, PipelineConfig, ProgressCallback,
};
use serde_json::{Map, Value};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress bar for multi-file runs. Files complete out of order.
struct CliProgressCallback {
    bar: ProgressBar,
    cache_hits: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} files  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            cache_hits: AtomicUsize::new(0),
        })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
    }

    fn on_file_complete(&self, path: &Path, cache_hit: bool) {
        if cache_hit {
            self.cache_hits.fetch_add(1, Ordering::SeqCst);
        }
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            path.display(),
            dim(if cache_hit { "cached" } else { "converted" }),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, path: &Path, error: String) {
        // Truncate very long error messages to keep output tidy.
        let msg = match error.char_indices().nth(100) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error,
        };
        self.bar
            .println(format!("  {} {}  {}", red("✗"), path.display(), red(&msg)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total_files.saturating_sub(success_count);
        let hits = self.cache_hits.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} files converted ({} from cache)",
                green("✔"),
                bold(&success_count.to_string()),
                hits
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                red("✘"),
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one document to JSON on stdout
  pandoc-fold posts/hello.md

  # Cache results between runs
  pandoc-fold --cache-dir .pandoc-cache posts/*.md

  # Also render HTML through pandoc
  pandoc-fold --format html notebook.ipynb -o notebook.json

  # Emit the ES module a bundler plugin would import
  pandoc-fold --module letter.docx

SUPPORTED INPUTS:
  .md      pandoc markdown (YAML header block → metadata)
  .ipynb   Jupyter notebook
  .docx    Word document (read by path)

ENVIRONMENT VARIABLES:
  PANDOC_FOLD_CACHE_DIR   Cache root (omit to disable caching)
  PANDOC_FOLD_FORMAT      json or html
  PANDOC_FOLD_PANDOC      Path to the pandoc executable
  RUST_LOG                Log filter, e.g. pandoc_fold=debug
"#;

/// Convert documents to normalised pandoc JSON with metadata.
#[derive(Parser, Debug)]
#[command(
    name = "pandoc-fold",
    version,
    about = "Convert documents to compact pandoc JSON with metadata",
    long_about = "Convert Markdown, Jupyter notebooks and Word documents into pandoc's JSON \
AST with adjacent text runs folded together, paired with metadata from file timestamps and \
YAML header blocks. Results can be cached per source file.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Source documents (.md, .ipynb, .docx).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write the result to this file instead of stdout (single input only).
    #[arg(short, long, env = "PANDOC_FOLD_OUTPUT")]
    output: Option<PathBuf>,

    /// Cache root directory; caching is off when omitted.
    #[arg(long, env = "PANDOC_FOLD_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Output format.
    #[arg(long, env = "PANDOC_FOLD_FORMAT", value_enum, default_value = "json")]
    format: FormatArg,

    /// Path to the pandoc executable.
    #[arg(long, env = "PANDOC_FOLD_PANDOC", default_value = "pandoc")]
    pandoc: PathBuf,

    /// Number of documents converted at once.
    #[arg(short, long, env = "PANDOC_FOLD_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Print the bundler ES module (`export default {...};`) instead of JSON.
    #[arg(long)]
    module: bool,

    /// Print compact JSON instead of pretty-printed JSON.
    #[arg(long)]
    compact: bool,

    /// Disable progress bar.
    #[arg(long, env = "PANDOC_FOLD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PANDOC_FOLD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PANDOC_FOLD_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum FormatArg {
    Json,
    Html,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Html => OutputFormat::Html,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.output.is_some() && cli.inputs.len() > 1 {
        anyhow::bail!("--output accepts a single input, got {}", cli.inputs.len());
    }

    // ── Logging setup ────────────────────────────────────────────────────
    let batch = cli.inputs.len() > 1;
    let show_progress = batch && !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let rendered = if batch {
        render_batch(&cli, &config).await?
    } else {
        let input = &cli.inputs[0];
        let (doc, status) = convert_for_output(input, &config)
            .await
            .with_context(|| format!("Conversion failed for {}", input.display()))?;
        if !cli.quiet {
            eprintln!("{} {}  {}", green("✔"), input.display(), dim(&format!("{status:?}")));
        }
        render_one(&cli, &doc)?
    };

    match cli.output {
        Some(ref path) => {
            tokio::fs::write(path, &rendered)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !cli.quiet {
                eprintln!("   →  {}", bold(&path.display().to_string()));
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")?;
            if !rendered.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .format(cli.format.clone().into())
        .pandoc_path(&cli.pandoc)
        .concurrency(cli.concurrency);

    if let Some(ref dir) = cli.cache_dir {
        builder = builder.cache_loc(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn render_one(cli: &Cli, doc: &ConvertedDocument) -> Result<String> {
    if cli.module {
        return Ok(module_for(doc)?.code);
    }
    to_json(cli, doc)
}

/// Convert every input; print a JSON object (or one module per line) keyed by path.
async fn render_batch(cli: &Cli, config: &PipelineConfig) -> Result<String> {
    let mut results: Vec<(PathBuf, ConvertedDocument)> = Vec::new();
    let mut failures = 0usize;

    let mut stream = convert_stream(cli.inputs.iter().cloned(), config);
    while let Some((path, result)) = stream.next().await {
        match result {
            Ok(doc) => results.push((path, doc)),
            Err(e) => {
                failures += 1;
                if config.progress_callback.is_none() {
                    eprintln!("{} {}: {}", red("✗"), path.display(), e);
                }
            }
        }
    }
    if failures > 0 {
        anyhow::bail!("{failures} of {} documents failed", cli.inputs.len());
    }

    // Completion order is arbitrary; print in argument order.
    results.sort_by_key(|(path, _)| cli.inputs.iter().position(|p| p == path));

    if cli.module {
        let modules = results
            .iter()
            .map(|(_, doc)| module_for(doc).map(|m| m.code))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(modules.join("\n"));
    }

    let mut by_path = Map::new();
    for (path, doc) in results {
        let value = serde_json::to_value(&doc).context("Failed to serialise output")?;
        by_path.insert(path.display().to_string(), value);
    }
    to_json(cli, &Value::Object(by_path))
}

fn to_json<T: serde::Serialize>(cli: &Cli, value: &T) -> Result<String> {
    let json = if cli.compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    json.context("Failed to serialise output")
}
