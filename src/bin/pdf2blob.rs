//! CLI binary for pdf2blob.
//!
//! A thin shim over the library crate: resolves the input, maps CLI flags to
//! `PipelineConfig`, runs one document through the `Coordinator` and prints
//! the outcome.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2blob::config::{DEFAULT_BLOB_PREFIX, DEFAULT_CONTAINER, DEFAULT_SCALE};
use pdf2blob::pipeline::input::{display_name, resolve_input};
use pdf2blob::{
    Coordinator, MemoryBlobStore, Outcome, PdfiumLibrary, PdfiumRasterizer, PipelineConfig,
    PipelineObserver, PipelineState, StoreConfig,
};
use std::io;
use std::process::ExitCode;
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal progress: a spinner while the PDF opens, then one bar that is
/// reused for rendering and for uploading.
struct CliObserver {
    bar: ProgressBar,
    max_image_bytes: usize,
}

impl CliObserver {
    fn new(max_image_bytes: usize) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            max_image_bytes,
        })
    }

    fn activate_bar(&self, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(style);
    }
}

impl PipelineObserver for CliObserver {
    fn on_state_change(&self, state: PipelineState) {
        match state {
            PipelineState::Converting => self.bar.set_prefix("Rendering"),
            PipelineState::Publishing => {
                self.bar.set_prefix("Uploading");
                self.bar.set_position(0);
            }
            s if s.is_terminal() => self.bar.finish_and_clear(),
            _ => {}
        }
    }

    fn on_document_opened(&self, page_count: usize) {
        self.activate_bar(page_count);
        self.bar.println(format!(
            "{} {}",
            bold("◆"),
            bold(&format!("{page_count} pages to rasterise"))
        ));
    }

    fn on_page_rendered(&self, page_num: usize, size_bytes: usize) {
        let mark = if size_bytes > self.max_image_bytes {
            red("✗")
        } else {
            green("✓")
        };
        self.bar.println(format!(
            "  {} Page {:>3}  {}",
            mark,
            page_num,
            dim(&format!("{:>9} bytes", size_bytes)),
        ));
        self.bar.inc(1);
    }

    fn on_page_uploaded(&self, _page_num: usize, _locator: &str) {
        self.bar.inc(1);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Rasterise a local PDF and upload every page
  pdf2blob invoice.pdf

  # Render and gate only; nothing leaves the machine
  pdf2blob --dry-run invoice.pdf

  # From a URL, JSON outcome on stdout
  pdf2blob --json https://example.com/invoice.pdf > outcome.json

  # Different container and blob prefix, four uploads in flight
  pdf2blob --container scans --prefix inv --concurrency 4 invoice.pdf

OUTCOME:
  Success   {"imageUrls": ["https://.../image-page0-1700000000000.png", ...]}
  Failure   {"error": "At least one image exceeds the limit (5 MB): ..."}
  Not a PDF nothing is printed and the exit status is 0

ENVIRONMENT VARIABLES:
  BLOB_CONNECTION_STRING  Azure Storage connection string (required unless --dry-run)
                          Also read from a .env file in the working directory.
  PDFIUM_LIB_PATH         Path to libpdfium; otherwise the system library is used
  RUST_LOG                Overrides the log filter (e.g. pdf2blob=debug)
"#;

/// Rasterise PDF pages and publish them to Azure Blob Storage.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2blob",
    version,
    about = "Rasterise PDF pages to PNG and publish them to Azure Blob Storage",
    long_about = "Rasterise every page of a PDF (local file or URL) to PNG and upload each page \
to an Azure Blob Storage container. If any page image exceeds the size limit, nothing is uploaded.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Declared content type of the input. Default: guessed from the file
    /// extension, or the `Content-Type` header for URLs.
    #[arg(long, env = "PDF2BLOB_CONTENT_TYPE")]
    content_type: Option<String>,

    /// Target container (must already exist).
    #[arg(long, env = "PDF2BLOB_CONTAINER", default_value = DEFAULT_CONTAINER)]
    container: String,

    /// First component of every blob name.
    #[arg(long, env = "PDF2BLOB_PREFIX", default_value = DEFAULT_BLOB_PREFIX)]
    prefix: String,

    /// Render scale relative to the page size in PDF points (0.1–10).
    #[arg(long, env = "PDF2BLOB_SCALE", default_value_t = DEFAULT_SCALE)]
    scale: f32,

    /// Largest admissible page image, in MiB.
    #[arg(long, env = "PDF2BLOB_MAX_IMAGE_MB", default_value_t = 5.0)]
    max_image_mb: f64,

    /// Number of uploads in flight at once.
    #[arg(short, long, env = "PDF2BLOB_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Render and check sizes but keep images in memory instead of uploading.
    #[arg(long, env = "PDF2BLOB_DRY_RUN")]
    dry_run: bool,

    /// Print the outcome as JSON.
    #[arg(long, env = "PDF2BLOB_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2BLOB_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2BLOB_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2BLOB_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2BLOB_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // With the progress bar active, dependencies are held to warnings but
    // the pipeline's own report lines still reach stderr.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
        "warn,pdf2blob=info"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Startup: credential and engine ───────────────────────────────────
    let store_config = if cli.dry_run {
        None
    } else {
        Some(StoreConfig::from_env().context("Object store is not configured")?)
    };

    let config = build_config(&cli)?;
    let max_image_bytes = config.max_image_bytes;
    let config = if show_progress {
        let observer: Arc<dyn PipelineObserver> = CliObserver::new(max_image_bytes);
        PipelineConfig { observer, ..config }
    } else {
        config
    };

    let coordinator = match store_config {
        Some(ref store) => Coordinator::connect(store, config)
            .await
            .context("Failed to initialise pipeline")?,
        None => {
            let library = PdfiumLibrary::from_env();
            library
                .verify()
                .await
                .context("Failed to load the PDFium engine")?;
            let store = MemoryBlobStore::new(config.container.clone());
            Coordinator::new(
                Arc::new(PdfiumRasterizer::new(library)),
                Arc::new(store),
                config,
            )
        }
    };

    // ── Run ──────────────────────────────────────────────────────────────
    let document = resolve_input(&cli.input, cli.content_type.as_deref(), cli.download_timeout)
        .await
        .with_context(|| format!("Failed to read {}", display_name(&cli.input)))?;

    // Not a PDF: the coordinator has already logged the notice.
    let Some(outcome) = coordinator.process(document).await else {
        return Ok(ExitCode::SUCCESS);
    };

    print_outcome(&cli, &outcome)?;

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    if !cli.max_image_mb.is_finite() || cli.max_image_mb <= 0.0 {
        anyhow::bail!("--max-image-mb must be positive (got {})", cli.max_image_mb);
    }
    let max_image_bytes = (cli.max_image_mb * 1024.0 * 1024.0).round() as usize;

    PipelineConfig::builder()
        .scale(cli.scale)
        .max_image_bytes(max_image_bytes)
        .container(cli.container.clone())
        .blob_prefix(cli.prefix.clone())
        .upload_concurrency(cli.concurrency)
        .build()
        .context("Invalid configuration")
}

fn print_outcome(cli: &Cli, outcome: &Outcome) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(outcome).context("Failed to serialise outcome")?;
        println!("{json}");
        return Ok(());
    }

    match outcome {
        Outcome::Published { image_urls } => {
            for url in image_urls {
                println!("{url}");
            }
            if !cli.quiet {
                eprintln!(
                    "{} {} pages published{}",
                    green("✔"),
                    bold(&image_urls.len().to_string()),
                    if cli.dry_run { dim(" (dry run)") } else { String::new() }
                );
            }
        }
        // Already reported through the error log line.
        Outcome::Failed(_) => {}
    }
    Ok(())
}
