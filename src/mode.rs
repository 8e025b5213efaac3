//! Conversion modes and the media types they accept.
//!
//! The mode is the single switch of an intake session: it decides which media
//! type the validator expects, which extractor produces the preview, which
//! remote endpoint receives the upload and which extension the download gets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Media type of a PDF document.
pub const MEDIA_TYPE_PDF: &str = "application/pdf";

/// Media type of an OOXML word-processing document (`.docx`).
pub const MEDIA_TYPE_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Declared type for anything we do not recognise.
pub const MEDIA_TYPE_UNKNOWN: &str = "application/octet-stream";

/// The selected source → target format pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversionMode {
    /// PDF in, `.docx` out. (default)
    #[default]
    PdfToWord,
    /// `.docx` in, PDF out.
    WordToPdf,
}

impl ConversionMode {
    pub const ALL: [ConversionMode; 2] = [ConversionMode::PdfToWord, ConversionMode::WordToPdf];

    /// Media type a file must declare to be accepted in this mode.
    pub fn expected_media_type(self) -> &'static str {
        match self {
            ConversionMode::PdfToWord => MEDIA_TYPE_PDF,
            ConversionMode::WordToPdf => MEDIA_TYPE_DOCX,
        }
    }

    /// Extension (without dot) of the converted document.
    pub fn target_extension(self) -> &'static str {
        match self {
            ConversionMode::PdfToWord => "docx",
            ConversionMode::WordToPdf => "pdf",
        }
    }

    /// Short human label, e.g. "PDF → Word".
    pub fn label(self) -> &'static str {
        match self {
            ConversionMode::PdfToWord => "PDF → Word",
            ConversionMode::WordToPdf => "Word → PDF",
        }
    }

    /// The mode that accepts `media_type` as input, if any.
    pub fn for_media_type(media_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.expected_media_type() == media_type)
    }

    fn slug(self) -> &'static str {
        match self {
            ConversionMode::PdfToWord => "pdf-to-word",
            ConversionMode::WordToPdf => "word-to-pdf",
        }
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ConversionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf-to-word" | "pdf2word" | "pdf2docx" => Ok(ConversionMode::PdfToWord),
            "word-to-pdf" | "word2pdf" | "docx2pdf" => Ok(ConversionMode::WordToPdf),
            other => Err(format!(
                "unknown conversion mode '{other}' (expected pdf-to-word or word-to-pdf)"
            )),
        }
    }
}

/// Media type a file picker would declare for `path`, judged by extension.
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => MEDIA_TYPE_PDF,
        Some("docx") => MEDIA_TYPE_DOCX,
        _ => MEDIA_TYPE_UNKNOWN,
    }
}
