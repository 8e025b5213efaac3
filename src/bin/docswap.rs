//! CLI binary for edgequake-docswap.
//!
//! A thin shim over [`IntakeController`]: the command line plays the file
//! picker, the mode selector, the preview panel and the save-as dialog.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_docswap::{
    ClientConfig, ConversionMode, DirectorySink, DocSwapError, DownloadReceipt,
    ExtractionProgressCallback, Extractors, HttpTransport, IntakeController, IntakeReport,
    PageSeparator, ProgressCallback, SelectedFile, SessionSnapshot,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner while the document opens, then a page bar for PDFs.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preview");
        bar.set_message("Opening document…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_document_opened(&self, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_pages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Extracting");
    }

    fn on_page_extracted(&self, page_num: usize, total_pages: usize, chars: usize) {
        self.bar.set_message(format!("page {page_num}/{total_pages}"));
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{chars:>5} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, char_count: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} characters extracted",
            green("✔"),
            bold(&char_count.to_string())
        );
    }

    fn on_extraction_error(&self, _error: &str) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Preview and convert a PDF to Word (mode inferred from the extension)
  docswap report.pdf

  # Convert a Word document to PDF into ./out
  docswap --mode word-to-pdf memo.docx -o out

  # Only show the extracted text, in full
  docswap --preview-only --full report.pdf

  # Keep PDF pages apart in the preview
  docswap --separator newline --preview-only book.pdf

  # Machine-readable session report
  docswap --json report.pdf > report.json

LIMITS:
  PDF → Word accepts application/pdf only.
  Word → PDF accepts .docx (OOXML) only.
  Files larger than 5 MiB are refused before upload.

ENVIRONMENT VARIABLES:
  DOCSWAP_SERVER          Conversion service base URL (default http://127.0.0.1:5000)
  DOCSWAP_OUTPUT_DIR      Where converted files are saved (default: .)
  DOCSWAP_TIMEOUT         Conversion request timeout in seconds (default 120)
  PDFIUM_LIB_PATH         Path to libpdfium used for PDF previews
"#;

/// Validate, preview and convert PDF / Word documents.
#[derive(Parser, Debug)]
#[command(
    name = "docswap",
    version,
    about = "Validate, preview and convert PDF / Word documents",
    long_about = "Check a PDF or .docx file against the selected conversion mode, show a text \
preview with word and character counts, then send the original file to a remote conversion \
service and save the converted document.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF or .docx file.
    input: PathBuf,

    /// Conversion mode. Inferred from the file type when omitted.
    #[arg(short, long, env = "DOCSWAP_MODE", value_enum)]
    mode: Option<ModeArg>,

    /// Base URL of the conversion service.
    #[arg(long, env = "DOCSWAP_SERVER", default_value = "http://127.0.0.1:5000")]
    server: String,

    /// Directory receiving the converted document.
    #[arg(short, long, env = "DOCSWAP_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Declared media type, overriding the one guessed from the extension.
    #[arg(long)]
    media_type: Option<String>,

    /// Show the preview and stop; nothing is uploaded.
    #[arg(long)]
    preview_only: bool,

    /// Show the whole preview instead of the first 500 characters.
    #[arg(long)]
    full: bool,

    /// Between PDF pages in the preview: none, space, newline, or custom string.
    #[arg(long, env = "DOCSWAP_SEPARATOR", default_value = "none")]
    separator: String,

    /// Conversion request timeout in seconds.
    #[arg(long, env = "DOCSWAP_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Print a JSON session report instead of the preview text.
    #[arg(long, env = "DOCSWAP_JSON")]
    json: bool,

    /// Disable progress output.
    #[arg(long, env = "DOCSWAP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCSWAP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCSWAP_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    PdfToWord,
    WordToPdf,
}

impl From<ModeArg> for ConversionMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::PdfToWord => ConversionMode::PdfToWord,
            ModeArg::WordToPdf => ConversionMode::WordToPdf,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs are noise next to the progress bar.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Pick file and mode ───────────────────────────────────────────────
    let file = SelectedFile::open(&cli.input, cli.media_type.as_deref())
        .await
        .with_context(|| format!("Cannot open {}", cli.input.display()))?;
    let mode = cli
        .mode
        .map(ConversionMode::from)
        .or_else(|| ConversionMode::for_media_type(file.media_type()))
        .unwrap_or_default();

    let config = build_config(&cli)?;
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let controller = build_controller(config, progress)?;

    controller.select_mode(mode);
    if !cli.quiet && !cli.json {
        eprintln!(
            "{} {}  {}",
            cyan("◆"),
            bold(mode.label()),
            dim(&format!("{} ({} bytes)", file.name(), file.size())),
        );
    }

    // ── Validate + preview ───────────────────────────────────────────────
    match controller.load_preview(file).await {
        Ok(_) => {}
        Err(DocSwapError::Extraction(e)) => {
            // Preview is informational; the file can still be converted.
            if !cli.quiet {
                eprintln!("{} {}", red("✗"), e.user_message());
            }
        }
        Err(e) => return fail(&cli, &controller, e),
    }

    if cli.full && !controller.snapshot().preview.is_some_and(|p| p.is_expanded) {
        controller.toggle_preview();
    }
    if !cli.json && !cli.quiet {
        print_preview(&controller.snapshot());
    }

    if cli.preview_only {
        return finish(&cli, &controller, None);
    }

    // ── Submit ───────────────────────────────────────────────────────────
    let spinner = if show_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Converting");
        bar.set_message(controller.config().base_url.clone());
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let outcome = controller.submit().await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    match outcome {
        Ok(receipt) => {
            if !cli.quiet && !cli.json {
                eprintln!(
                    "{}  {} bytes  {}ms  →  {}",
                    green("✔"),
                    receipt.bytes,
                    receipt.duration_ms,
                    bold(&receipt.path.display().to_string()),
                );
            }
            finish(&cli, &controller, Some(receipt))
        }
        Err(e) => fail(&cli, &controller, e),
    }
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .base_url(cli.server.clone())
        .output_dir(cli.output_dir.clone())
        .page_separator(parse_separator(&cli.separator))
        .request_timeout_secs(cli.timeout);
    if let Ok(path) = std::env::var("PDFIUM_LIB_PATH") {
        builder = builder.pdfium_library_path(path);
    }
    builder.build().context("Invalid configuration")
}

fn build_controller(
    config: ClientConfig,
    progress: Option<ProgressCallback>,
) -> Result<IntakeController> {
    let mut extractors = Extractors::native(config.pdfium_library_path.clone())
        .with_page_separator(config.page_separator.clone());
    if let Some(cb) = progress {
        extractors = extractors.with_progress(cb);
    }
    let transport =
        Arc::new(HttpTransport::new(&config).context("Failed to build HTTP client")?);
    let sink = Arc::new(DirectorySink::new(config.output_dir.clone()));
    Ok(IntakeController::with_parts(config, extractors, transport, sink))
}

/// Parse `--separator` string into `PageSeparator`.
fn parse_separator(s: &str) -> PageSeparator {
    match s.to_lowercase().as_str() {
        "none" => PageSeparator::None,
        "space" => PageSeparator::Space,
        "newline" | "nl" => PageSeparator::Newline,
        _ => PageSeparator::Custom(s.to_string()),
    }
}

fn print_preview(snapshot: &SessionSnapshot) {
    let Some(preview) = &snapshot.preview else {
        return;
    };
    eprintln!(
        "{}",
        dim(&format!(
            "Words: {}  Characters: {}",
            preview.word_count, preview.char_count
        ))
    );
    println!("{}", preview.text);
    if preview.can_toggle && !preview.is_expanded {
        eprintln!("{}", dim("(truncated, use --full to show everything)"));
    }
}

fn print_report(controller: &IntakeController, download: Option<DownloadReceipt>) -> Result<()> {
    let report = IntakeReport {
        session: controller.snapshot(),
        download,
    };
    let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
    println!("{json}");
    Ok(())
}

fn finish(cli: &Cli, controller: &IntakeController, download: Option<DownloadReceipt>) -> Result<()> {
    if cli.json {
        print_report(controller, download)?;
    }
    Ok(())
}

/// Report `e` with its user-facing text; the detail goes in the error chain.
fn fail(cli: &Cli, controller: &IntakeController, e: DocSwapError) -> Result<()> {
    if cli.json {
        print_report(controller, None)?;
    }
    match e {
        DocSwapError::Validation(_) | DocSwapError::Extraction(_) | DocSwapError::Transaction(_) => {
            let message = e.user_message();
            Err(anyhow::Error::new(e).context(message))
        }
        other => Err(other.into()),
    }
}
