//! Conversion transaction: upload, await, download.
//!
//! One transaction is one submit → network round trip → download cycle:
//!
//! 1. refuse without a file (no request is sent)
//! 2. post the original file bytes to the endpoint of the active mode
//! 3. on a success status, read the body and save it as
//!    `<original stem>.<target extension>`
//! 4. on anything else, fail with a [`TransactionError`]; nothing is saved
//!
//! There is no automatic retry. Session bookkeeping (in-flight flag,
//! notices) lives in [`crate::controller`]; this module is the transaction
//! itself and the one-shot helpers built on it.

use crate::config::ClientConfig;
use crate::download::{DirectorySink, DownloadSink};
use crate::error::{DocSwapError, TransactionError, ValidationError};
use crate::intake::SelectedFile;
use crate::mode::ConversionMode;
use crate::output::DownloadReceipt;
use crate::pipeline::{ExtractionTicket, Extractors};
use crate::preview::PreviewState;
use crate::transport::{ConversionTransport, HttpTransport, UploadRequest};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Base name used when the original name has no extension to strip.
pub const FALLBACK_BASE_NAME: &str = "converted_file";

/// Name of the converted download for an input called `original`.
///
/// The last extension is replaced by the mode's target extension. A name
/// without an extension (or a bare dot-file like `.pdf`) falls back to
/// [`FALLBACK_BASE_NAME`].
///
/// ```rust
/// use edgequake_docswap::{output_file_name, ConversionMode};
///
/// assert_eq!(output_file_name("report.pdf", ConversionMode::PdfToWord), "report.docx");
/// assert_eq!(output_file_name("report", ConversionMode::WordToPdf), "converted_file.pdf");
/// ```
pub fn output_file_name(original: &str, mode: ConversionMode) -> String {
    let stem = match original.rfind('.') {
        Some(dot) if dot > 0 => &original[..dot],
        _ => FALLBACK_BASE_NAME,
    };
    format!("{}.{}", stem, mode.target_extension())
}

/// Run one conversion transaction for `file` in `mode`.
///
/// # Errors
/// - [`ValidationError::NoFileSelected`] when `file` is `None`; nothing is sent
/// - [`TransactionError`] for a non-success status, a network failure or a
///   failed save; nothing is downloaded
pub async fn submit(
    file: Option<&SelectedFile>,
    mode: ConversionMode,
    config: &ClientConfig,
    transport: &dyn ConversionTransport,
    sink: &dyn DownloadSink,
) -> Result<DownloadReceipt, DocSwapError> {
    let file = file.ok_or(ValidationError::NoFileSelected)?;
    let start = Instant::now();

    let request = UploadRequest {
        url: config.endpoint_url(mode)?,
        field_name: config.field_name.clone(),
        file_name: file.name().to_string(),
        media_type: file.media_type().to_string(),
        bytes: Arc::clone(file.bytes()),
    };
    info!(
        "Submitting '{}' ({} bytes) for {} → {}",
        file.name(),
        file.size(),
        mode,
        request.url
    );

    let response = transport.upload(request).await.map_err(|e| {
        warn!("Conversion request failed: {}", e);
        e
    })?;
    if !response.is_success() {
        warn!("Conversion service rejected '{}': HTTP {}", file.name(), response.status);
        return Err(TransactionError::Rejected {
            status: response.status,
        }
        .into());
    }

    let file_name = output_file_name(file.name(), mode);
    let path = sink.save(&file_name, &response.body).await.map_err(|e| {
        warn!("Saving '{}' failed: {}", file_name, e);
        e
    })?;

    let receipt = DownloadReceipt {
        file_name,
        path,
        bytes: response.body.len() as u64,
        mode,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Conversion complete: '{}' ({} bytes) in {}ms",
        receipt.file_name, receipt.bytes, receipt.duration_ms
    );
    Ok(receipt)
}

/// Load, validate and convert a local file, saving into `config.output_dir`.
///
/// This is the library entry point for callers that do not need a preview
/// or an interactive session.
pub async fn convert_file(
    path: impl AsRef<Path>,
    mode: ConversionMode,
    config: &ClientConfig,
) -> Result<DownloadReceipt, DocSwapError> {
    let file = SelectedFile::open_for(path, None, mode, config.max_upload_bytes).await?;

    let transport = HttpTransport::new(config)?;
    let sink = DirectorySink::new(config.output_dir.clone());
    submit(Some(&file), mode, config, &transport, &sink).await
}

/// Synchronous wrapper around [`convert_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_file_sync(
    path: impl AsRef<Path>,
    mode: ConversionMode,
    config: &ClientConfig,
) -> Result<DownloadReceipt, DocSwapError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocSwapError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_file(path, mode, config))
}

/// Load, validate and extract a local file's preview text.
///
/// Does not contact the conversion service.
pub async fn preview_file(
    path: impl AsRef<Path>,
    mode: ConversionMode,
    config: &ClientConfig,
) -> Result<PreviewState, DocSwapError> {
    let file = SelectedFile::open_for(path, None, mode, config.max_upload_bytes).await?;

    let extractors = Extractors::native(config.pdfium_library_path.clone())
        .with_page_separator(config.page_separator.clone());
    let text = extractors.run(&ExtractionTicket::new(&file, mode)).await?;
    Ok(PreviewState::from_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{MEDIA_TYPE_DOCX, MEDIA_TYPE_PDF};
    use crate::transport::UploadResponse;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Answers every upload with a canned status/body and remembers requests.
    struct CannedTransport {
        status: u16,
        body: Vec<u8>,
        requests: Mutex<Vec<UploadRequest>>,
    }

    impl CannedTransport {
        fn new(status: u16, body: &[u8]) -> Self {
            Self {
                status,
                body: body.to_vec(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ConversionTransport for CannedTransport {
        async fn upload(&self, request: UploadRequest) -> Result<UploadResponse, TransactionError> {
            self.requests.lock().unwrap().push(request);
            Ok(UploadResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    struct Unreachable;

    #[async_trait]
    impl ConversionTransport for Unreachable {
        async fn upload(&self, request: UploadRequest) -> Result<UploadResponse, TransactionError> {
            Err(TransactionError::Network {
                url: request.url.to_string(),
                detail: "connection refused".into(),
            })
        }
    }

    #[derive(Default)]
    struct CountingSink {
        saves: AtomicUsize,
        names: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DownloadSink for CountingSink {
        async fn save(&self, file_name: &str, _bytes: &[u8]) -> Result<PathBuf, TransactionError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.names.lock().unwrap().push(file_name.to_string());
            Ok(PathBuf::from(file_name))
        }
    }

    #[test]
    fn output_names() {
        use ConversionMode::*;
        assert_eq!(output_file_name("report.pdf", PdfToWord), "report.docx");
        assert_eq!(output_file_name("report.docx", WordToPdf), "report.pdf");
        assert_eq!(output_file_name("report", WordToPdf), "converted_file.pdf");
        assert_eq!(output_file_name("q3.final.pdf", PdfToWord), "q3.final.docx");
        assert_eq!(output_file_name(".pdf", PdfToWord), "converted_file.docx");
        assert_eq!(output_file_name("report.", WordToPdf), "report.pdf");
    }

    #[tokio::test]
    async fn missing_file_sends_nothing() {
        let transport = CannedTransport::new(200, b"never");
        let sink = CountingSink::default();
        let err = submit(
            None,
            ConversionMode::PdfToWord,
            &ClientConfig::default(),
            &transport,
            &sink,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            DocSwapError::Validation(ValidationError::NoFileSelected)
        ));
        assert_eq!(err.user_message(), "Please upload a file first.");
        assert_eq!(transport.count(), 0);
        assert_eq!(sink.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_downloads_once_with_target_name() {
        let file = SelectedFile::new("report.pdf", MEDIA_TYPE_PDF, b"%PDF-1.7".to_vec());
        let transport = CannedTransport::new(200, b"PK docx bytes");
        let sink = CountingSink::default();

        let receipt = submit(
            Some(&file),
            ConversionMode::PdfToWord,
            &ClientConfig::default(),
            &transport,
            &sink,
        )
        .await
        .unwrap();

        assert_eq!(receipt.file_name, "report.docx");
        assert_eq!(receipt.bytes, 13);
        assert_eq!(sink.saves.load(Ordering::SeqCst), 1);

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.path(), "/convert/pdf-to-word");
        assert_eq!(requests[0].field_name, "file");
        assert_eq!(&requests[0].bytes[..], b"%PDF-1.7");
    }

    #[tokio::test]
    async fn endpoint_follows_mode() {
        let file = SelectedFile::new("memo", MEDIA_TYPE_DOCX, b"PK".to_vec());
        let transport = CannedTransport::new(200, b"%PDF");
        let sink = CountingSink::default();

        let receipt = submit(
            Some(&file),
            ConversionMode::WordToPdf,
            &ClientConfig::default(),
            &transport,
            &sink,
        )
        .await
        .unwrap();

        assert_eq!(receipt.file_name, "converted_file.pdf");
        assert_eq!(
            transport.requests.lock().unwrap()[0].url.path(),
            "/convert/word-to-pdf"
        );
    }

    #[tokio::test]
    async fn non_success_status_downloads_nothing() {
        let file = SelectedFile::new("report.pdf", MEDIA_TYPE_PDF, b"%PDF".to_vec());
        let transport = CannedTransport::new(500, b"{\"error\":\"boom\"}");
        let sink = CountingSink::default();

        let err = submit(
            Some(&file),
            ConversionMode::PdfToWord,
            &ClientConfig::default(),
            &transport,
            &sink,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            DocSwapError::Transaction(TransactionError::Rejected { status: 500 })
        ));
        assert_eq!(err.user_message(), "Conversion failed. Please try again.");
        assert_eq!(sink.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn network_failure_downloads_nothing() {
        let file = SelectedFile::new("report.pdf", MEDIA_TYPE_PDF, b"%PDF".to_vec());
        let sink = CountingSink::default();

        let err = submit(
            Some(&file),
            ConversionMode::PdfToWord,
            &ClientConfig::default(),
            &Unreachable,
            &sink,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            DocSwapError::Transaction(TransactionError::Network { .. })
        ));
        assert!(sink.names.lock().unwrap().is_empty());
    }

    #[test]
    fn convert_file_sync_reports_missing_input() {
        let err = convert_file_sync(
            "/definitely/not/here.pdf",
            ConversionMode::PdfToWord,
            &ClientConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DocSwapError::FileNotFound { .. }));
    }

    #[test]
    fn preview_file_rejects_wrong_type_before_extracting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"plain text").unwrap();

        let err = tokio_test::block_on(preview_file(
            &path,
            ConversionMode::PdfToWord,
            &ClientConfig::default(),
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            DocSwapError::Validation(ValidationError::WrongMediaType { .. })
        ));
    }
}
