//! Result types handed back to callers.

use crate::mode::ConversionMode;
use crate::session::SessionSnapshot;
use serde::Serialize;
use std::path::PathBuf;

/// Proof of one successful conversion transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadReceipt {
    /// Name the converted document was offered under, e.g. `report.docx`.
    pub file_name: String,
    /// Where the download sink stored it.
    pub path: PathBuf,
    /// Size of the converted document.
    pub bytes: u64,
    pub mode: ConversionMode,
    /// Wall-clock time of the round trip plus save.
    pub duration_ms: u64,
}

/// What the CLI prints with `--json`: final session view plus the download,
/// if one happened.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeReport {
    pub session: SessionSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<DownloadReceipt>,
}
