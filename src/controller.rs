//! The session controller.
//!
//! [`IntakeController`] owns the [`SessionState`] of one intake session and
//! is the only thing that mutates it. Every user action becomes a
//! [`SessionEvent`] run through [`reduce`]; the resulting
//! [`SessionSnapshot`] is published on a `watch` channel for observers.
//!
//! The controller composes the pieces without adding rules of its own:
//! [`intake::check`] gates file picks, [`Extractors`] produce preview text,
//! [`convert::submit`] runs the transaction. The state lock is never held
//! across an `.await`; check-then-transition steps (accepting a pick,
//! starting a submit) happen under a single lock so two callers cannot both
//! pass the same check.

use crate::config::ClientConfig;
use crate::convert;
use crate::download::{DirectorySink, DownloadSink};
use crate::error::{DocSwapError, ExtractionError, ValidationError};
use crate::intake::{self, SelectedFile};
use crate::mode::ConversionMode;
use crate::output::DownloadReceipt;
use crate::pipeline::{ExtractionTicket, Extractors};
use crate::session::{reduce, SessionEvent, SessionSnapshot, SessionState, TransactionState};
use crate::transport::{ConversionTransport, HttpTransport};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub struct IntakeController {
    config: ClientConfig,
    state: Mutex<SessionState>,
    extractors: Extractors,
    transport: Arc<dyn ConversionTransport>,
    sink: Arc<dyn DownloadSink>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl IntakeController {
    /// Controller with the native extractors, the HTTP transport and a
    /// directory sink writing into `config.output_dir`.
    pub fn new(config: ClientConfig) -> Result<Self, DocSwapError> {
        let extractors = Extractors::native(config.pdfium_library_path.clone())
            .with_page_separator(config.page_separator.clone());
        let transport = Arc::new(HttpTransport::new(&config)?);
        let sink = Arc::new(DirectorySink::new(config.output_dir.clone()));
        Ok(Self::with_parts(config, extractors, transport, sink))
    }

    /// Controller over caller-supplied capabilities.
    pub fn with_parts(
        config: ClientConfig,
        extractors: Extractors,
        transport: Arc<dyn ConversionTransport>,
        sink: Arc<dyn DownloadSink>,
    ) -> Self {
        let state = SessionState::default();
        let (snapshots, _) = watch::channel(state.snapshot(config.preview_limit));
        Self {
            config,
            state: Mutex::new(state),
            extractors,
            transport,
            sink,
            snapshots,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn extractors(&self) -> &Extractors {
        &self.extractors
    }

    /// A copy of the current state.
    pub fn state(&self) -> SessionState {
        self.lock().clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receive a snapshot after every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    // ── Actions ──────────────────────────────────────────────────────────

    /// Switch modes. Clears the selected file and its preview.
    pub fn select_mode(&self, mode: ConversionMode) -> SessionSnapshot {
        info!("Mode → {}", mode);
        self.dispatch(SessionEvent::ModeSelected(mode))
    }

    /// Validate and accept a picked file.
    ///
    /// On success the returned ticket identifies the extraction the session
    /// now waits for; run it with [`Extractors::run`] and hand the outcome to
    /// [`apply_extraction`](Self::apply_extraction). On rejection the previous
    /// file and preview are cleared.
    pub fn select_file(&self, file: SelectedFile) -> Result<ExtractionTicket, ValidationError> {
        let mut state = self.lock();
        let mode = state.mode();
        match intake::check(&file, mode, self.config.max_upload_bytes) {
            Ok(()) => {
                info!("Accepted {} '{}' ({} bytes)", file.id(), file.name(), file.size());
                let ticket = ExtractionTicket::new(&file, mode);
                self.apply(&mut state, SessionEvent::FileAccepted(file));
                Ok(ticket)
            }
            Err(e) => {
                warn!("Rejected '{}': {}", file.name(), e);
                self.apply(&mut state, SessionEvent::FileRejected(e.clone()));
                Err(e)
            }
        }
    }

    /// Apply an extraction outcome. Returns `false` (and changes nothing)
    /// when the ticket's file is no longer the one awaiting a preview.
    pub fn apply_extraction(
        &self,
        ticket: &ExtractionTicket,
        result: Result<String, ExtractionError>,
    ) -> bool {
        let mut state = self.lock();
        let file_id = ticket.file_id();
        if !state.awaits_extraction(file_id) {
            warn!("Discarding stale extraction for file {}", file_id);
            return false;
        }
        let event = match result {
            Ok(text) => SessionEvent::ExtractionSucceeded { file_id, text },
            Err(error) => {
                warn!("Extraction failed for file {}: {}", file_id, error);
                SessionEvent::ExtractionFailed { file_id, error }
            }
        };
        self.apply(&mut state, event);
        true
    }

    /// Select `file`, extract its preview and apply it.
    ///
    /// Extraction failures are reported as errors but leave the file selected
    /// and submittable.
    pub async fn load_preview(&self, file: SelectedFile) -> Result<SessionSnapshot, DocSwapError> {
        let ticket = self.select_file(file)?;
        match self.extractors.run(&ticket).await {
            Ok(text) => {
                self.apply_extraction(&ticket, Ok(text));
                Ok(self.snapshot())
            }
            Err(e) => {
                self.apply_extraction(&ticket, Err(e.clone()));
                Err(e.into())
            }
        }
    }

    /// Flip the preview between truncated and full display.
    pub fn toggle_preview(&self) -> SessionSnapshot {
        self.dispatch(SessionEvent::PreviewToggled {
            limit: self.config.preview_limit,
        })
    }

    /// Convert the selected file and save the result.
    ///
    /// Refused without a file or while another submission is in flight;
    /// neither case sends a request. Whatever the outcome, the transaction
    /// is back to idle when this returns.
    pub async fn submit(&self) -> Result<DownloadReceipt, DocSwapError> {
        let (file, mode) = {
            let mut state = self.lock();
            if state.transaction() == TransactionState::InFlight {
                let e = ValidationError::SubmissionInFlight;
                self.apply(&mut state, SessionEvent::SubmitRejected(e.clone()));
                return Err(e.into());
            }
            let Some(file) = state.file().cloned() else {
                let e = ValidationError::NoFileSelected;
                self.apply(&mut state, SessionEvent::SubmitRejected(e.clone()));
                return Err(e.into());
            };
            let mode = state.mode();
            self.apply(&mut state, SessionEvent::SubmitStarted);
            (file, mode)
        };

        let result = convert::submit(
            Some(&file),
            mode,
            &self.config,
            self.transport.as_ref(),
            self.sink.as_ref(),
        )
        .await;

        match &result {
            Ok(receipt) => self.dispatch(SessionEvent::SubmitSucceeded {
                file_name: receipt.file_name.clone(),
            }),
            Err(e) => self.dispatch(SessionEvent::SubmitFailed {
                message: e.user_message(),
            }),
        };
        self.dispatch(SessionEvent::TransactionSettled);
        result
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn dispatch(&self, event: SessionEvent) -> SessionSnapshot {
        let mut state = self.lock();
        self.apply(&mut state, event)
    }

    fn apply(&self, state: &mut SessionState, event: SessionEvent) -> SessionSnapshot {
        debug!("event: {:?}", event);
        *state = reduce(std::mem::take(state), event);
        let snapshot = state.snapshot(self.config.preview_limit);
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }
}

impl std::fmt::Debug for IntakeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntakeController")
            .field("config", &self.config)
            .field("state", &*self.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransactionError;
    use crate::mode::{MEDIA_TYPE_DOCX, MEDIA_TYPE_PDF};
    use crate::pipeline::docx::DocxDecoder;
    use crate::pipeline::pdf::{DecodedPdf, PdfDecoder};
    use crate::session::NoticeLevel;
    use crate::transport::{UploadRequest, UploadResponse};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    // ── Fakes ────────────────────────────────────────────────────────────

    /// Pages are the bytes split on `|`, words on spaces.
    struct SplitPdf;
    struct SplitDoc(Vec<String>);

    impl PdfDecoder for SplitPdf {
        fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn DecodedPdf + 'a>, ExtractionError> {
            let text = std::str::from_utf8(bytes).map_err(|e| ExtractionError::OpenFailed {
                detail: e.to_string(),
            })?;
            if !text.starts_with("%PDF") {
                return Err(ExtractionError::OpenFailed {
                    detail: "missing header".into(),
                });
            }
            Ok(Box::new(SplitDoc(
                text["%PDF".len()..].split('|').map(str::to_string).collect(),
            )))
        }
    }

    impl DecodedPdf for SplitDoc {
        fn page_count(&self) -> usize {
            self.0.len()
        }
        fn page_fragments(&self, index: usize) -> Result<Vec<String>, ExtractionError> {
            Ok(self.0[index].split(' ').map(str::to_string).collect())
        }
    }

    struct Utf8Docx;

    impl DocxDecoder for Utf8Docx {
        fn raw_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
            Ok(String::from_utf8_lossy(bytes).into_owned())
        }
    }

    struct FixedTransport {
        status: u16,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ConversionTransport for FixedTransport {
        async fn upload(&self, _req: UploadRequest) -> Result<UploadResponse, TransactionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(UploadResponse {
                status: self.status,
                body: if self.status == 200 {
                    b"converted".to_vec()
                } else {
                    Vec::new()
                },
            })
        }
    }

    /// Holds every upload until the gate opens.
    #[derive(Default)]
    struct GatedTransport {
        gate: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ConversionTransport for GatedTransport {
        async fn upload(&self, _req: UploadRequest) -> Result<UploadResponse, TransactionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(UploadResponse {
                status: 200,
                body: b"late".to_vec(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        saved: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DownloadSink for RecordingSink {
        async fn save(&self, file_name: &str, _bytes: &[u8]) -> Result<PathBuf, TransactionError> {
            self.saved.lock().unwrap().push(file_name.to_string());
            Ok(PathBuf::from(file_name))
        }
    }

    fn controller(
        transport: Arc<dyn ConversionTransport>,
        sink: Arc<RecordingSink>,
    ) -> IntakeController {
        IntakeController::with_parts(
            ClientConfig::default(),
            Extractors::new(Arc::new(SplitPdf), Arc::new(Utf8Docx)),
            transport,
            sink,
        )
    }

    fn fixed(status: u16) -> Arc<FixedTransport> {
        Arc::new(FixedTransport {
            status,
            calls: AtomicUsize::new(0),
        })
    }

    fn pdf(name: &str, body: &str) -> SelectedFile {
        SelectedFile::new(name, MEDIA_TYPE_PDF, body.as_bytes().to_vec())
    }

    // ── Tests ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn preview_then_submit() {
        let transport = fixed(200);
        let sink = Arc::new(RecordingSink::default());
        let c = controller(transport.clone(), sink.clone());

        let snap = c
            .load_preview(pdf("report.pdf", "%PDFone two|three"))
            .await
            .unwrap();
        let preview = snap.preview.unwrap();
        assert_eq!(preview.text, "one twothree");
        assert_eq!(preview.word_count, 2);

        let receipt = c.submit().await.unwrap();
        assert_eq!(receipt.file_name, "report.docx");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*sink.saved.lock().unwrap(), vec!["report.docx".to_string()]);

        let snap = c.snapshot();
        assert_eq!(snap.transaction, TransactionState::Idle);
        assert_eq!(snap.last_download.as_deref(), Some("report.docx"));
    }

    #[tokio::test]
    async fn submit_without_file_sends_nothing() {
        let transport = fixed(200);
        let sink = Arc::new(RecordingSink::default());
        let c = controller(transport.clone(), sink.clone());

        let err = c.submit().await.unwrap_err();
        assert!(matches!(
            err,
            DocSwapError::Validation(ValidationError::NoFileSelected)
        ));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            c.snapshot().notice.unwrap().message,
            "Please upload a file first."
        );
    }

    #[tokio::test]
    async fn non_success_ends_idle_without_download() {
        let transport = fixed(500);
        let sink = Arc::new(RecordingSink::default());
        let c = controller(transport.clone(), sink.clone());
        c.select_file(pdf("report.pdf", "%PDFx")).unwrap();

        let err = c.submit().await.unwrap_err();
        assert_eq!(err.user_message(), "Conversion failed. Please try again.");

        let snap = c.snapshot();
        assert_eq!(snap.transaction, TransactionState::Idle);
        assert!(snap.last_download.is_none());
        assert!(sink.saved.lock().unwrap().is_empty());
        assert_eq!(snap.notice.unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn stale_extraction_is_discarded() {
        let c = controller(fixed(200), Arc::new(RecordingSink::default()));

        let first = c.select_file(pdf("first.pdf", "%PDFfirst")).unwrap();
        let second = c.select_file(pdf("second.pdf", "%PDFsecond")).unwrap();

        let second_text = c.extractors().run(&second).await.unwrap();
        assert!(c.apply_extraction(&second, Ok(second_text)));

        let first_text = c.extractors().run(&first).await.unwrap();
        assert!(!c.apply_extraction(&first, Ok(first_text)));

        let state = c.state();
        assert_eq!(state.file().unwrap().name(), "second.pdf");
        assert_eq!(state.preview().unwrap().extracted_text(), "second");
    }

    #[tokio::test]
    async fn mode_change_resets_file_and_preview() {
        let c = controller(fixed(200), Arc::new(RecordingSink::default()));
        let ticket = c.select_file(pdf("a.pdf", "%PDFhello")).unwrap();

        let snap = c.select_mode(ConversionMode::WordToPdf);
        assert!(snap.file.is_none());
        assert!(snap.preview.is_none());
        assert!(!snap.can_submit);

        assert!(!c.apply_extraction(&ticket, Ok("hello".into())));
        assert!(c.snapshot().preview.is_none());
    }

    #[tokio::test]
    async fn wrong_type_is_rejected_for_mode() {
        let c = controller(fixed(200), Arc::new(RecordingSink::default()));
        let docx = SelectedFile::new("memo.docx", MEDIA_TYPE_DOCX, b"PK".to_vec());

        let err = c.select_file(docx.clone()).unwrap_err();
        assert_eq!(err.user_message(), "Please select a valid PDF file.");
        assert!(c.snapshot().file.is_none());

        c.select_mode(ConversionMode::WordToPdf);
        assert!(c.select_file(docx).is_ok());
    }

    #[tokio::test]
    async fn extraction_failure_keeps_file_submittable() {
        let transport = fixed(200);
        let sink = Arc::new(RecordingSink::default());
        let c = controller(transport.clone(), sink);

        let err = c.load_preview(pdf("broken.pdf", "garbage")).await.unwrap_err();
        assert!(matches!(err, DocSwapError::Extraction(_)));
        assert_eq!(err.user_message(), "Failed to extract text from file.");

        let snap = c.snapshot();
        assert!(snap.preview.is_none());
        assert!(snap.can_submit);
        assert!(c.submit().await.is_ok());
    }

    #[tokio::test]
    async fn second_submit_is_refused_while_in_flight() {
        let transport = Arc::new(GatedTransport::default());
        let sink = Arc::new(RecordingSink::default());
        let c = Arc::new(controller(transport.clone(), sink.clone()));
        c.select_file(pdf("report.pdf", "%PDFx")).unwrap();

        let mut rx = c.subscribe();
        let first = tokio::spawn({
            let c = Arc::clone(&c);
            async move { c.submit().await }
        });
        rx.wait_for(|s| s.transaction == TransactionState::InFlight)
            .await
            .unwrap();

        let err = c.submit().await.unwrap_err();
        assert!(matches!(
            err,
            DocSwapError::Validation(ValidationError::SubmissionInFlight)
        ));

        transport.gate.notify_one();
        let receipt = first.await.unwrap().unwrap();
        assert_eq!(receipt.file_name, "report.docx");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(sink.saved.lock().unwrap().len(), 1);
        assert_eq!(c.snapshot().transaction, TransactionState::Idle);
    }

    #[tokio::test]
    async fn toggle_flips_long_previews() {
        let c = controller(fixed(200), Arc::new(RecordingSink::default()));
        let body = format!("%PDF{}", "w".repeat(600));
        c.load_preview(pdf("long.pdf", &body)).await.unwrap();

        let collapsed = c.snapshot().preview.unwrap();
        assert!(collapsed.can_toggle);
        assert_eq!(collapsed.text.chars().count(), 503);

        let expanded = c.toggle_preview().preview.unwrap();
        assert!(expanded.is_expanded);
        assert_eq!(expanded.text.chars().count(), 600);
    }

    #[tokio::test]
    async fn observers_see_every_transition() {
        let c = controller(fixed(200), Arc::new(RecordingSink::default()));
        let mut rx = c.subscribe();

        c.select_mode(ConversionMode::WordToPdf);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().mode, ConversionMode::WordToPdf);
        assert!(!rx.has_changed().unwrap());
    }
}
