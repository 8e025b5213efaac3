//! Progress-callback trait for text extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] into
//! [`crate::pipeline::Extractors::with_progress`] to receive events while a
//! document is decoded. PDF extraction reports once per page; Word extraction
//! is a single decode and only reports start and completion.
//!
//! # Example
//!
//! ```rust
//! use edgequake_docswap::ExtractionProgressCallback;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for PageCounter {
//!     fn on_page_extracted(&self, page_num: usize, total_pages: usize, chars: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num}/{total_pages}: {chars} chars");
//!     }
//! }
//!
//! let cb: Arc<dyn ExtractionProgressCallback> = Arc::new(PageCounter {
//!     pages: AtomicUsize::new(0),
//! });
//! cb.on_page_extracted(1, 3, 120);
//! ```

use std::sync::Arc;

/// Called by the extractors as a document is decoded.
///
/// Extraction runs on a blocking worker thread, so implementations must be
/// `Send + Sync`. All methods default to no-ops.
pub trait ExtractionProgressCallback: Send + Sync {
    /// The document opened and its page count is known.
    fn on_document_opened(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// One page's text was read.
    ///
    /// # Arguments
    /// * `page_num`    : 1-indexed page number
    /// * `total_pages` : pages in the document
    /// * `chars`       : characters contributed by this page
    fn on_page_extracted(&self, page_num: usize, total_pages: usize, chars: usize) {
        let _ = (page_num, total_pages, chars);
    }

    /// All text was decoded.
    fn on_extraction_complete(&self, char_count: usize) {
        let _ = char_count;
    }

    /// Extraction failed; `error` is the detailed (log-level) description.
    fn on_extraction_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias for the shared callback handle.
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
