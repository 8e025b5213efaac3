//! Intake session state and its transitions.
//!
//! ## Why a reducer
//!
//! Everything a front end shows (mode, selected file, preview, busy flags,
//! the last message) lives in one [`SessionState`] value. It changes only
//! through [`reduce`], a pure function of `(state, event)`, so every
//! transition can be tested without a runtime, a network or a decoder.
//! Observers never see the state itself, only [`SessionSnapshot`]s.
//!
//! ## Stale extractions
//!
//! A file pick records the picked file's [`FileId`] as the pending
//! extraction. Extraction results carry the id they were issued for and are
//! ignored unless it is still the pending one, so a slow decode of an earlier
//! pick can never overwrite the preview of a later one.

use crate::error::{ExtractionError, ValidationError};
use crate::intake::{FileId, FileSummary, SelectedFile};
use crate::mode::ConversionMode;
use crate::preview::{PreviewState, PreviewView};
use serde::Serialize;

// ── State ────────────────────────────────────────────────────────────────

/// Progress of the conversion transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

/// Progress of the preview extraction for the selected file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionStatus {
    #[default]
    Idle,
    Pending(FileId),
    Failed(FileId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// The one message a front end shows next to the controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Complete state of one intake session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    mode: ConversionMode,
    file: Option<SelectedFile>,
    preview: Option<PreviewState>,
    extraction: ExtractionStatus,
    transaction: TransactionState,
    last_download: Option<String>,
    notice: Option<Notice>,
}

impl SessionState {
    pub fn mode(&self) -> ConversionMode {
        self.mode
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn preview(&self) -> Option<&PreviewState> {
        self.preview.as_ref()
    }

    pub fn extraction(&self) -> ExtractionStatus {
        self.extraction
    }

    pub fn transaction(&self) -> TransactionState {
        self.transaction
    }

    pub fn last_download(&self) -> Option<&str> {
        self.last_download.as_deref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Whether a result for `file_id` would still be applied.
    pub fn awaits_extraction(&self, file_id: FileId) -> bool {
        self.extraction == ExtractionStatus::Pending(file_id)
            && self.file.as_ref().map(SelectedFile::id) == Some(file_id)
    }

    /// A file is selected and no transaction is running.
    pub fn can_submit(&self) -> bool {
        self.file.is_some() && self.transaction != TransactionState::InFlight
    }

    /// Immutable view for observers, with the preview cut at `preview_limit`.
    pub fn snapshot(&self, preview_limit: usize) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            file: self.file.as_ref().map(SelectedFile::summary),
            preview: self.preview.as_ref().map(|p| p.view(preview_limit)),
            extracting: matches!(self.extraction, ExtractionStatus::Pending(_)),
            transaction: self.transaction,
            can_submit: self.can_submit(),
            last_download: self.last_download.clone(),
            notice: self.notice.clone(),
        }
    }
}

/// What observers receive after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub mode: ConversionMode,
    pub file: Option<FileSummary>,
    pub preview: Option<PreviewView>,
    pub extracting: bool,
    pub transaction: TransactionState,
    pub can_submit: bool,
    pub last_download: Option<String>,
    pub notice: Option<Notice>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        SessionState::default().snapshot(crate::preview::PREVIEW_LIMIT)
    }
}

// ── Events ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The user picked a conversion mode. Always clears file and preview.
    ModeSelected(ConversionMode),
    /// A picked file failed validation.
    FileRejected(ValidationError),
    /// A picked file passed validation; its extraction is now pending.
    FileAccepted(SelectedFile),
    ExtractionSucceeded { file_id: FileId, text: String },
    ExtractionFailed { file_id: FileId, error: ExtractionError },
    PreviewToggled { limit: usize },
    /// Submit was refused before anything was sent.
    SubmitRejected(ValidationError),
    SubmitStarted,
    SubmitSucceeded { file_name: String },
    SubmitFailed { message: String },
    /// The transaction outcome has been shown; back to idle.
    TransactionSettled,
}

// ── Reducer ──────────────────────────────────────────────────────────────

/// Apply `event` to `state`.
pub fn reduce(mut state: SessionState, event: SessionEvent) -> SessionState {
    match event {
        SessionEvent::ModeSelected(mode) => {
            state.mode = mode;
            clear_file(&mut state);
            state.notice = None;
        }
        SessionEvent::FileRejected(error) => {
            clear_file(&mut state);
            state.notice = Some(Notice::error(error.user_message()));
        }
        SessionEvent::FileAccepted(file) => {
            state.extraction = ExtractionStatus::Pending(file.id());
            state.file = Some(file);
            state.preview = None;
            state.notice = None;
        }
        SessionEvent::ExtractionSucceeded { file_id, text } => {
            if state.awaits_extraction(file_id) {
                state.preview = Some(PreviewState::from_text(text));
                state.extraction = ExtractionStatus::Idle;
            }
        }
        SessionEvent::ExtractionFailed { file_id, error } => {
            if state.awaits_extraction(file_id) {
                state.preview = None;
                state.extraction = ExtractionStatus::Failed(file_id);
                state.notice = Some(Notice::error(error.user_message()));
            }
        }
        SessionEvent::PreviewToggled { limit } => {
            if let Some(preview) = state.preview.as_mut() {
                preview.toggle(limit);
            }
        }
        SessionEvent::SubmitRejected(error) => {
            state.notice = Some(Notice::error(error.user_message()));
        }
        SessionEvent::SubmitStarted => {
            if state.file.is_some() {
                state.transaction = TransactionState::InFlight;
                state.notice = None;
            }
        }
        SessionEvent::SubmitSucceeded { file_name } => {
            if state.transaction == TransactionState::InFlight {
                state.transaction = TransactionState::Succeeded;
                state.notice = Some(Notice::info(format!("Downloaded {}", file_name)));
                state.last_download = Some(file_name);
            }
        }
        SessionEvent::SubmitFailed { message } => {
            if state.transaction == TransactionState::InFlight {
                state.transaction = TransactionState::Failed;
                state.notice = Some(Notice::error(message));
            }
        }
        SessionEvent::TransactionSettled => {
            if matches!(
                state.transaction,
                TransactionState::Succeeded | TransactionState::Failed
            ) {
                state.transaction = TransactionState::Idle;
            }
        }
    }
    state
}

fn clear_file(state: &mut SessionState) {
    state.file = None;
    state.preview = None;
    state.extraction = ExtractionStatus::Idle;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CONVERSION_FAILED_MESSAGE;
    use crate::mode::{MEDIA_TYPE_DOCX, MEDIA_TYPE_PDF};
    use crate::preview::PREVIEW_LIMIT;

    fn pdf(name: &str) -> SelectedFile {
        SelectedFile::new(name, MEDIA_TYPE_PDF, b"%PDF-1.7".to_vec())
    }

    fn run(events: impl IntoIterator<Item = SessionEvent>) -> SessionState {
        events.into_iter().fold(SessionState::default(), reduce)
    }

    fn with_preview(text: &str) -> SessionState {
        let file = pdf("a.pdf");
        let id = file.id();
        run([
            SessionEvent::FileAccepted(file),
            SessionEvent::ExtractionSucceeded {
                file_id: id,
                text: text.to_string(),
            },
        ])
    }

    #[test]
    fn starts_empty_in_pdf_to_word() {
        let s = SessionState::default();
        assert_eq!(s.mode(), ConversionMode::PdfToWord);
        assert!(s.file().is_none());
        assert!(s.preview().is_none());
        assert_eq!(s.transaction(), TransactionState::Idle);
        assert!(!s.can_submit());
    }

    #[test]
    fn accepted_file_awaits_its_extraction() {
        let file = pdf("a.pdf");
        let id = file.id();
        let s = run([SessionEvent::FileAccepted(file)]);
        assert!(s.awaits_extraction(id));
        assert!(s.snapshot(PREVIEW_LIMIT).extracting);
        assert!(s.can_submit());
    }

    #[test]
    fn extraction_builds_preview() {
        let s = with_preview("one two three");
        let p = s.preview().unwrap();
        assert_eq!(p.word_count(), 3);
        assert_eq!(p.char_count(), 13);
        assert_eq!(s.extraction(), ExtractionStatus::Idle);
    }

    #[test]
    fn mode_change_clears_everything_derived() {
        for next in ConversionMode::ALL {
            let mut s = with_preview(&"x".repeat(600));
            s = reduce(s, SessionEvent::PreviewToggled { limit: PREVIEW_LIMIT });
            assert!(s.preview().unwrap().is_expanded());

            let s = reduce(s, SessionEvent::ModeSelected(next));
            assert_eq!(s.mode(), next);
            assert!(s.file().is_none());
            assert!(s.preview().is_none());
            assert_eq!(s.extraction(), ExtractionStatus::Idle);
        }
    }

    #[test]
    fn mode_change_drops_pending_extraction() {
        let file = pdf("a.pdf");
        let id = file.id();
        let s = run([
            SessionEvent::FileAccepted(file),
            SessionEvent::ModeSelected(ConversionMode::WordToPdf),
            SessionEvent::ExtractionSucceeded {
                file_id: id,
                text: "late".into(),
            },
        ]);
        assert!(s.preview().is_none());
    }

    #[test]
    fn last_pick_wins() {
        let first = pdf("first.pdf");
        let second = pdf("second.pdf");
        let (first_id, second_id) = (first.id(), second.id());

        let s = run([
            SessionEvent::FileAccepted(first),
            SessionEvent::FileAccepted(second),
            SessionEvent::ExtractionSucceeded {
                file_id: second_id,
                text: "second text".into(),
            },
            SessionEvent::ExtractionSucceeded {
                file_id: first_id,
                text: "first text".into(),
            },
        ]);

        assert_eq!(s.file().unwrap().name(), "second.pdf");
        assert_eq!(s.preview().unwrap().extracted_text(), "second text");
    }

    #[test]
    fn stale_failure_is_ignored() {
        let first = pdf("first.pdf");
        let second = pdf("second.pdf");
        let first_id = first.id();
        let s = run([
            SessionEvent::FileAccepted(first),
            SessionEvent::FileAccepted(second),
            SessionEvent::ExtractionFailed {
                file_id: first_id,
                error: ExtractionError::OpenFailed {
                    detail: "bad".into(),
                },
            },
        ]);
        assert!(s.notice().is_none());
        assert!(matches!(s.extraction(), ExtractionStatus::Pending(_)));
    }

    #[test]
    fn extraction_failure_leaves_preview_empty_but_submittable() {
        let file = pdf("broken.pdf");
        let id = file.id();
        let s = run([
            SessionEvent::FileAccepted(file),
            SessionEvent::ExtractionFailed {
                file_id: id,
                error: ExtractionError::OpenFailed {
                    detail: "not a pdf".into(),
                },
            },
        ]);
        assert!(s.preview().is_none());
        assert_eq!(s.extraction(), ExtractionStatus::Failed(id));
        assert_eq!(
            s.notice().unwrap().message,
            "Failed to extract text from file."
        );
        assert!(s.can_submit());
    }

    #[test]
    fn rejected_pick_clears_previous_file() {
        let s = with_preview("kept?");
        let s = reduce(
            s,
            SessionEvent::FileRejected(ValidationError::TooLarge {
                size: 6 * 1024 * 1024,
                limit: 5 * 1024 * 1024,
            }),
        );
        assert!(s.file().is_none());
        assert!(s.preview().is_none());
        let notice = s.notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "File size exceeds 5MB limit.");
    }

    #[test]
    fn toggle_only_applies_to_long_text() {
        let short = reduce(
            with_preview(&"y".repeat(400)),
            SessionEvent::PreviewToggled { limit: PREVIEW_LIMIT },
        );
        let view = short.snapshot(PREVIEW_LIMIT).preview.unwrap();
        assert!(!view.can_toggle);
        assert!(!view.is_expanded);
        assert_eq!(view.text.chars().count(), 400);

        let long = with_preview(&"z".repeat(600));
        let collapsed = long.snapshot(PREVIEW_LIMIT).preview.unwrap();
        assert_eq!(collapsed.text, format!("{}...", "z".repeat(500)));

        let long = reduce(long, SessionEvent::PreviewToggled { limit: PREVIEW_LIMIT });
        let expanded = long.snapshot(PREVIEW_LIMIT).preview.unwrap();
        assert_eq!(expanded.text.chars().count(), 600);
    }

    #[test]
    fn successful_transaction_returns_to_idle() {
        let s = run([
            SessionEvent::FileAccepted(pdf("report.pdf")),
            SessionEvent::SubmitStarted,
        ]);
        assert_eq!(s.transaction(), TransactionState::InFlight);
        assert!(!s.can_submit());

        let s = reduce(
            s,
            SessionEvent::SubmitSucceeded {
                file_name: "report.docx".into(),
            },
        );
        assert_eq!(s.transaction(), TransactionState::Succeeded);
        assert_eq!(s.last_download(), Some("report.docx"));

        let s = reduce(s, SessionEvent::TransactionSettled);
        assert_eq!(s.transaction(), TransactionState::Idle);
        assert!(s.can_submit());
    }

    #[test]
    fn failed_transaction_returns_to_idle_without_download() {
        let s = run([
            SessionEvent::FileAccepted(pdf("report.pdf")),
            SessionEvent::SubmitStarted,
            SessionEvent::SubmitFailed {
                message: CONVERSION_FAILED_MESSAGE.into(),
            },
        ]);
        assert_eq!(s.transaction(), TransactionState::Failed);
        let s = reduce(s, SessionEvent::TransactionSettled);
        assert_eq!(s.transaction(), TransactionState::Idle);
        assert!(s.last_download().is_none());
        assert_eq!(s.notice().unwrap().message, CONVERSION_FAILED_MESSAGE);
    }

    #[test]
    fn submit_without_file_never_goes_in_flight() {
        let s = run([
            SessionEvent::SubmitRejected(ValidationError::NoFileSelected),
            SessionEvent::SubmitStarted,
        ]);
        assert_eq!(s.transaction(), TransactionState::Idle);
        assert_eq!(s.notice().unwrap().message, "Please upload a file first.");
    }

    #[test]
    fn snapshot_serialises_for_observers() {
        let file = SelectedFile::new("memo.docx", MEDIA_TYPE_DOCX, b"PK".to_vec());
        let s = run([
            SessionEvent::ModeSelected(ConversionMode::WordToPdf),
            SessionEvent::FileAccepted(file),
        ]);
        let json = serde_json::to_value(s.snapshot(PREVIEW_LIMIT)).unwrap();
        assert_eq!(json["mode"], "word-to-pdf");
        assert_eq!(json["file"]["name"], "memo.docx");
        assert_eq!(json["transaction"], "idle");
        assert_eq!(json["extracting"], true);
        assert_eq!(json["can_submit"], true);
    }
}
