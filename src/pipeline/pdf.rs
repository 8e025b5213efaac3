//! PDF text extraction: page-ordered text from raw PDF bytes.
//!
//! ## Decode capability
//!
//! The decoder itself sits behind [`PdfDecoder`]: open bytes, learn the page
//! count, then ask for one page's text fragments at a time. [`PdfiumDecoder`]
//! is the production backend; tests plug in fakes.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library with thread-local state and blocking calls. The
//! whole open → pages → close sequence runs on one blocking-pool thread so
//! the async workers never stall, and so the document never crosses threads.
//!
//! ## Joining rules
//!
//! Fragments of one page are joined with a single space. Pages are appended
//! in strictly increasing order with [`PageSeparator`] between them, which is
//! empty by default.

use crate::config::PageSeparator;
use crate::error::ExtractionError;
use crate::progress::{ExtractionProgressCallback, ProgressCallback};
use once_cell::sync::OnceCell;
use pdfium_render::prelude::{PdfDocument, PdfPageIndex, Pdfium};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Opens PDF bytes for page-by-page text access.
pub trait PdfDecoder: Send + Sync {
    /// Open `bytes` as a paginated document.
    ///
    /// Fails with [`ExtractionError::OpenFailed`] on corrupt or non-PDF input.
    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn DecodedPdf + 'a>, ExtractionError>;
}

/// An opened PDF. The page count is only known after opening.
pub trait DecodedPdf {
    fn page_count(&self) -> usize;

    /// Ordered text fragments of the page at 0-based `index`.
    fn page_fragments(&self, index: usize) -> Result<Vec<String>, ExtractionError>;
}

/// Extract the full text of a PDF.
///
/// Runs inside `spawn_blocking`; see the module docs.
pub async fn extract_pdf_text(
    decoder: Arc<dyn PdfDecoder>,
    bytes: Arc<[u8]>,
    separator: PageSeparator,
    progress: Option<ProgressCallback>,
) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || {
        let result =
            extract_pdf_text_blocking(decoder.as_ref(), &bytes, &separator, progress.as_deref());
        if let (Err(e), Some(cb)) = (&result, progress.as_deref()) {
            cb.on_extraction_error(&e.to_string());
        }
        result
    })
    .await
    .map_err(|e| ExtractionError::Internal(format!("PDF extraction task panicked: {}", e)))?
}

/// Blocking implementation of PDF text extraction.
pub fn extract_pdf_text_blocking(
    decoder: &dyn PdfDecoder,
    bytes: &[u8],
    separator: &PageSeparator,
    progress: Option<&dyn ExtractionProgressCallback>,
) -> Result<String, ExtractionError> {
    let document = decoder.open(bytes)?;
    let total_pages = document.page_count();
    info!("PDF opened: {} pages", total_pages);
    if let Some(cb) = progress {
        cb.on_document_opened(total_pages);
    }

    let mut text = String::new();
    for idx in 0..total_pages {
        let page_text = document.page_fragments(idx)?.join(" ");
        debug!("Page {}: {} chars", idx + 1, page_text.chars().count());
        if let Some(cb) = progress {
            cb.on_page_extracted(idx + 1, total_pages, page_text.chars().count());
        }
        if idx > 0 {
            text.push_str(separator.as_str());
        }
        text.push_str(&page_text);
    }

    if let Some(cb) = progress {
        cb.on_extraction_complete(text.chars().count());
    }
    Ok(text)
}

// ── pdfium backend ───────────────────────────────────────────────────────

/// [`PdfDecoder`] backed by libpdfium via `pdfium-render`.
///
/// The library is bound lazily on first use, from (in order) the explicit
/// path, `PDFIUM_LIB_PATH`, or the system library search path. A missing
/// library surfaces as [`ExtractionError::BackendUnavailable`] at extraction
/// time rather than at construction. The bound handle is shared by every
/// extraction, so the crate enables pdfium-render's `sync` feature.
pub struct PdfiumDecoder {
    library_path: Option<PathBuf>,
    pdfium: OnceCell<Pdfium>,
}

impl PdfiumDecoder {
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self {
            library_path,
            pdfium: OnceCell::new(),
        }
    }

    fn pdfium(&self) -> Result<&Pdfium, ExtractionError> {
        self.pdfium
            .get_or_try_init(|| bind_pdfium(self.library_path.as_deref()))
    }
}

impl Default for PdfiumDecoder {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PdfDecoder for PdfiumDecoder {
    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn DecodedPdf + 'a>, ExtractionError> {
        let document = self
            .pdfium()?
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| ExtractionError::OpenFailed {
                detail: format!("{:?}", e),
            })?;
        Ok(Box::new(PdfiumDocument { document }))
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl DecodedPdf for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_fragments(&self, index: usize) -> Result<Vec<String>, ExtractionError> {
        let page = self
            .document
            .pages()
            .get(index as PdfPageIndex)
            .map_err(|e| page_failed(index, e))?;
        let text = page.text().map_err(|e| page_failed(index, e))?;
        let fragments = text
            .segments()
            .iter()
            .map(|segment| segment.text())
            .collect();
        Ok(fragments)
    }
}

fn page_failed(index: usize, e: impl std::fmt::Debug) -> ExtractionError {
    ExtractionError::PageFailed {
        page: index + 1,
        detail: format!("{:?}", e),
    }
}

fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, ExtractionError> {
    let configured = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

    let bindings = match configured {
        Some(path) => {
            let library = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", library.display());
            Pdfium::bind_to_library(&library)
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ExtractionError::BackendUnavailable(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}
