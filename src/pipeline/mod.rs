//! Preview text extraction.
//!
//! Each submodule turns one document format into plain text:
//!
//! ```text
//!            ┌─▶ pdf   (pdfium, page by page)  ─┐
//! ticket ────┤                                  ├──▶ text
//!            └─▶ docx  (zip + quick-xml)       ─┘
//! ```
//!
//! 1. [`pdf`]: opens the document, then reads pages 1..N in order; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`docx`]: one decode of `word/document.xml`
//!
//! [`Extractors`] picks the stage from the [`ConversionMode`] and knows nothing
//! about session state. An [`ExtractionTicket`] carries the identity of the
//! file it was issued for, so whoever applies the result can tell whether it
//! is still wanted.

pub mod docx;
pub mod pdf;

use crate::config::PageSeparator;
use crate::error::ExtractionError;
use crate::intake::{FileId, SelectedFile};
use crate::mode::ConversionMode;
use crate::progress::ProgressCallback;
use docx::{DocxDecoder, OoxmlDecoder};
use pdf::{PdfDecoder, PdfiumDecoder};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// A pending extraction, tagged with the file it targets.
#[derive(Clone)]
pub struct ExtractionTicket {
    file_id: FileId,
    mode: ConversionMode,
    bytes: Arc<[u8]>,
}

impl ExtractionTicket {
    pub fn new(file: &SelectedFile, mode: ConversionMode) -> Self {
        Self {
            file_id: file.id(),
            mode,
            bytes: Arc::clone(file.bytes()),
        }
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    pub fn mode(&self) -> ConversionMode {
        self.mode
    }
}

impl std::fmt::Debug for ExtractionTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionTicket")
            .field("file_id", &self.file_id)
            .field("mode", &self.mode)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// The two format extractors plus their shared settings.
#[derive(Clone)]
pub struct Extractors {
    pdf: Arc<dyn PdfDecoder>,
    docx: Arc<dyn DocxDecoder>,
    page_separator: PageSeparator,
    progress: Option<ProgressCallback>,
}

impl Extractors {
    pub fn new(pdf: Arc<dyn PdfDecoder>, docx: Arc<dyn DocxDecoder>) -> Self {
        Self {
            pdf,
            docx,
            page_separator: PageSeparator::default(),
            progress: None,
        }
    }

    /// pdfium for PDFs, the built-in OOXML reader for `.docx`.
    pub fn native(pdfium_library_path: Option<PathBuf>) -> Self {
        Self::new(
            Arc::new(PdfiumDecoder::new(pdfium_library_path)),
            Arc::new(OoxmlDecoder),
        )
    }

    pub fn with_page_separator(mut self, sep: PageSeparator) -> Self {
        self.page_separator = sep;
        self
    }

    pub fn with_progress(mut self, cb: ProgressCallback) -> Self {
        self.progress = Some(cb);
        self
    }

    /// Extract text for `ticket` with the extractor its mode selects.
    pub async fn run(&self, ticket: &ExtractionTicket) -> Result<String, ExtractionError> {
        let bytes = Arc::clone(&ticket.bytes);
        let text = match ticket.mode {
            ConversionMode::PdfToWord => {
                pdf::extract_pdf_text(
                    Arc::clone(&self.pdf),
                    bytes,
                    self.page_separator.clone(),
                    self.progress.clone(),
                )
                .await?
            }
            ConversionMode::WordToPdf => {
                docx::extract_docx_text(Arc::clone(&self.docx), bytes, self.progress.clone())
                    .await?
            }
        };
        info!(
            "Extracted {} chars for file {} ({})",
            text.chars().count(),
            ticket.file_id,
            ticket.mode
        );
        Ok(text)
    }
}
