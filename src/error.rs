//! Error types for the edgequake-docswap library.
//!
//! Three error families follow the three places an intake session can fail:
//!
//! * [`ValidationError`]: the action is blocked before anything runs
//!   (no file, wrong media type, file too large, a submission already in flight).
//! * [`ExtractionError`]: the preview text could not be decoded. The preview
//!   stays empty; submission is still possible.
//! * [`TransactionError`]: the round trip to the remote converter failed or
//!   the converted bytes could not be saved. No download is triggered.
//!
//! None of them is fatal: every failure leaves the session interactive.
//! [`DocSwapError`] wraps the three families for the top-level entry points
//! and adds the input/config failures of the library surface itself.
//!
//! Each family has a `user_message()` with the generic text shown to the user.
//! The messages do not distinguish causes ("server down" and
//! "HTTP 500" read the same); the `Display` text keeps the detail for logs.

use crate::mode::MEDIA_TYPE_PDF;
use std::path::PathBuf;
use thiserror::Error;

/// Generic message for any failed extraction.
pub const EXTRACTION_FAILED_MESSAGE: &str = "Failed to extract text from file.";

/// Generic message for any failed conversion round trip.
pub const CONVERSION_FAILED_MESSAGE: &str = "Conversion failed. Please try again.";

/// All errors returned by the top-level edgequake-docswap functions.
#[derive(Debug, Error)]
pub enum DocSwapError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but reading it failed.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocSwapError {
    /// The user-facing message for this error.
    pub fn user_message(&self) -> String {
        match self {
            DocSwapError::Validation(e) => e.user_message(),
            DocSwapError::Extraction(e) => e.user_message().to_string(),
            DocSwapError::Transaction(e) => e.user_message().to_string(),
            other => other.to_string(),
        }
    }
}

/// The action was refused before any work was done.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Submit was requested with no file selected.
    #[error("No file selected")]
    NoFileSelected,

    /// Declared media type does not match the active conversion mode.
    #[error("Expected media type '{expected}', got '{found}'")]
    WrongMediaType {
        expected: &'static str,
        found: String,
    },

    /// File is larger than the upload limit.
    #[error("File is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    /// A conversion transaction is already running.
    #[error("A conversion is already in progress")]
    SubmissionInFlight,
}

impl ValidationError {
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::NoFileSelected => "Please upload a file first.".to_string(),
            ValidationError::WrongMediaType { expected, .. } => {
                if *expected == MEDIA_TYPE_PDF {
                    "Please select a valid PDF file.".to_string()
                } else {
                    "Please select a valid Word (.docx) file.".to_string()
                }
            }
            ValidationError::TooLarge { limit, .. } => {
                format!("File size exceeds {} limit.", format_limit(*limit))
            }
            ValidationError::SubmissionInFlight => {
                "A conversion is already in progress.".to_string()
            }
        }
    }
}

/// Human size for an upload limit: whole MiB read as `5MB`, fractions keep up
/// to two decimals (`1.5MB`), and limits under 1 MiB use KB or bytes.
fn format_limit(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    let scaled = |unit: u64, suffix: &str| {
        if bytes % unit == 0 {
            return format!("{}{}", bytes / unit, suffix);
        }
        let value = format!("{:.2}", bytes as f64 / unit as f64);
        format!("{}{}", value.trim_end_matches('0').trim_end_matches('.'), suffix)
    };
    if bytes >= MIB {
        scaled(MIB, "MB")
    } else if bytes >= KIB {
        scaled(KIB, "KB")
    } else {
        format!("{} bytes", bytes)
    }
}

/// Text could not be decoded from the selected document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The decode backend (e.g. libpdfium) could not be loaded.
    #[error(
        "PDF text backend unavailable: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    BackendUnavailable(String),

    /// The bytes could not be opened as a document.
    #[error("Could not open document: {detail}")]
    OpenFailed { detail: String },

    /// A single page's text could not be read.
    #[error("Could not read text of page {page}: {detail}")]
    PageFailed { page: usize, detail: String },

    /// The container opened but its content is not what the format requires.
    #[error("Malformed document: {detail}")]
    MalformedDocument { detail: String },

    #[error("Extraction task failed: {0}")]
    Internal(String),
}

impl ExtractionError {
    pub fn user_message(&self) -> &'static str {
        EXTRACTION_FAILED_MESSAGE
    }
}

/// The conversion round trip or the download save failed.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The service answered with a non-success status.
    #[error("Conversion service returned HTTP {status}")]
    Rejected { status: u16 },

    /// The request never produced a response.
    #[error("Could not reach conversion service at '{url}': {detail}")]
    Network { url: String, detail: String },

    /// The request exceeded the configured timeout.
    #[error("Conversion request to '{url}' timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    /// Status was fine but the body could not be read.
    #[error("Failed to read converted document: {detail}")]
    BodyRead { detail: String },

    /// The request could not be built (bad URL, bad media type, …).
    #[error("Invalid conversion request: {0}")]
    InvalidRequest(String),

    /// Converted bytes arrived but could not be written.
    #[error("Failed to save '{path}': {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransactionError {
    pub fn user_message(&self) -> &'static str {
        CONVERSION_FAILED_MESSAGE
    }
}
