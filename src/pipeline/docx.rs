//! Word-document text extraction: raw text from `.docx` bytes.
//!
//! A `.docx` file is a ZIP archive; the body lives in `word/document.xml`.
//! [`OoxmlDecoder`] walks that XML once and keeps only text:
//!
//! | Element | Output |
//! |---------|--------|
//! | `w:t` content | the text, verbatim |
//! | `w:tab` | `\t` |
//! | `w:br`, `w:cr` | `\n` |
//! | end of `w:p` | `\n\n` |
//!
//! Everything else (run properties, styles, drawings) is dropped.

use crate::error::ExtractionError;
use crate::progress::ProgressCallback;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::sync::Arc;
use tracing::debug;

/// Archive entry holding the document body.
const DOCUMENT_PART: &str = "word/document.xml";

/// Maximum decompressed bytes read from the body entry (zip-bomb guard).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Decodes word-processing-document bytes into raw text in one call.
pub trait DocxDecoder: Send + Sync {
    fn raw_text(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Extract the raw text of a `.docx` document.
///
/// The decode is a single blocking call, run via `spawn_blocking`.
pub async fn extract_docx_text(
    decoder: Arc<dyn DocxDecoder>,
    bytes: Arc<[u8]>,
    progress: Option<ProgressCallback>,
) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || {
        let result = decoder.raw_text(&bytes);
        if let Some(cb) = progress.as_deref() {
            match &result {
                Ok(text) => cb.on_extraction_complete(text.chars().count()),
                Err(e) => cb.on_extraction_error(&e.to_string()),
            }
        }
        result
    })
    .await
    .map_err(|e| ExtractionError::Internal(format!("DOCX extraction task panicked: {}", e)))?
}

/// [`DocxDecoder`] reading OOXML directly with `zip` + `quick-xml`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OoxmlDecoder;

impl DocxDecoder for OoxmlDecoder {
    fn raw_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let xml = read_document_part(bytes)?;
        let text = body_text(&xml)?;
        debug!(
            "DOCX body: {} bytes of XML → {} chars",
            xml.len(),
            text.chars().count()
        );
        Ok(text)
    }
}

fn read_document_part(bytes: &[u8]) -> Result<Vec<u8>, ExtractionError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractionError::OpenFailed {
            detail: format!("not a ZIP container: {}", e),
        })?;

    let entry = archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| ExtractionError::MalformedDocument {
            detail: format!("{} not found", DOCUMENT_PART),
        })?;

    let mut xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| ExtractionError::MalformedDocument {
            detail: format!("cannot inflate {}: {}", DOCUMENT_PART, e),
        })?;
    if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractionError::MalformedDocument {
            detail: format!("{} exceeds size limit", DOCUMENT_PART),
        });
    }
    Ok(xml)
}

fn body_text(xml: &[u8]) -> Result<String, ExtractionError> {
    let malformed = |e: quick_xml::Error| ExtractionError::MalformedDocument {
        detail: format!("{} is not valid XML: {}", DOCUMENT_PART, e),
    };

    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_text = false;
    // Tabs and breaks only count inside a run; `w:pPr/w:tabs` also holds
    // empty `w:tab` elements that are tab-stop definitions.
    let mut run_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf).map_err(malformed)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"r" => run_depth += 1,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"p" => out.push_str("\n\n"),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" if run_depth > 0 => out.push('\t'),
                b"br" | b"cr" if run_depth > 0 => out.push('\n'),
                b"p" => out.push_str("\n\n"),
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t.unescape().map_err(malformed)?;
                out.push_str(&text);
            }
            Event::CData(t) if in_text => {
                out.push_str(&String::from_utf8_lossy(&t));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}
