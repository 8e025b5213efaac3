//! # edgequake-docswap
//!
//! Validate, preview and convert PDF and Word documents through a remote
//! conversion service.
//!
//! ## Why this crate?
//!
//! Server-side converters are good at turning PDF into `.docx` and back, but
//! a client still has to do the unglamorous part well: refuse the wrong file
//! before uploading it, show the user what text is actually in the document,
//! keep the preview consistent when the user changes their mind mid-decode,
//! and save exactly one download per successful round trip. This crate is
//! that client, as a library with a thin CLI on top.
//!
//! ## Session Overview
//!
//! ```text
//! mode ──▶ pick file
//!            │
//!            ├─ 1. Validate  media type matches mode, size ≤ 5 MiB
//!            ├─ 2. Extract   pdfium (per page) or OOXML (one decode), spawn_blocking
//!            ├─ 3. Preview   word/char counts, 500-char truncation, toggle
//!            └─ 4. Submit    multipart POST → save `<stem>.<docx|pdf>`
//! ```
//!
//! The preview is informational only: submission re-sends the original file
//! bytes, never the extracted text.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docswap::{convert_file, ClientConfig, ConversionMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .base_url("http://127.0.0.1:5000")
//!         .output_dir("converted")
//!         .build()?;
//!     let receipt = convert_file("report.pdf", ConversionMode::PdfToWord, &config).await?;
//!     println!("saved {}", receipt.path.display());
//!     Ok(())
//! }
//! ```
//!
//! For an interactive front end, drive an [`IntakeController`] and render the
//! [`SessionSnapshot`]s it publishes.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docswap` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-docswap = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod controller;
pub mod convert;
pub mod download;
pub mod error;
pub mod intake;
pub mod mode;
pub mod output;
pub mod pipeline;
pub mod preview;
pub mod progress;
pub mod session;
pub mod transport;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder, PageSeparator};
pub use controller::IntakeController;
pub use convert::{convert_file, convert_file_sync, output_file_name, preview_file, submit};
pub use download::{DirectorySink, DownloadSink};
pub use error::{DocSwapError, ExtractionError, TransactionError, ValidationError};
pub use intake::{check, validate, FileId, SelectedFile, MAX_UPLOAD_BYTES};
pub use mode::{ConversionMode, MEDIA_TYPE_DOCX, MEDIA_TYPE_PDF};
pub use output::{DownloadReceipt, IntakeReport};
pub use pipeline::{ExtractionTicket, Extractors};
pub use preview::{PreviewState, PreviewView, PREVIEW_LIMIT};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{SessionEvent, SessionSnapshot, SessionState, TransactionState};
pub use transport::{ConversionTransport, HttpTransport};
