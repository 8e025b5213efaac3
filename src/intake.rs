//! File intake: the selected document and the gate it must pass.
//!
//! A [`SelectedFile`] is what a file picker hands over: name, declared media
//! type, size and the raw bytes. It is immutable; a new pick produces a new
//! value with a fresh [`FileId`], which is what stale extraction results are
//! checked against.
//!
//! Validation is media-type based, never extension based: a renamed file with
//! the right extension but the wrong declared type is rejected.

use crate::error::{DocSwapError, ValidationError};
use crate::mode::{media_type_for_path, ConversionMode};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Upload limit: 5 MiB, inclusive.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

static NEXT_FILE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one file pick. Two picks of the same bytes get different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileId(u64);

impl FileId {
    fn next() -> Self {
        FileId(NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A user-chosen document. Cheap to clone; the bytes are shared.
#[derive(Clone)]
pub struct SelectedFile {
    id: FileId,
    name: String,
    media_type: String,
    size: u64,
    bytes: Arc<[u8]>,
}

impl SelectedFile {
    /// Wrap in-memory content as a new pick.
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes: Arc<[u8]> = bytes.into();
        Self {
            id: FileId::next(),
            name: name.into(),
            media_type: media_type.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// Read a local file the way a file picker would present it.
    ///
    /// The declared media type comes from `media_type` when given, otherwise
    /// from the file extension. The whole file is read into memory; use
    /// [`SelectedFile::open_for`] to refuse oversized files before reading.
    pub async fn open(
        path: impl AsRef<Path>,
        media_type: Option<&str>,
    ) -> Result<Self, DocSwapError> {
        let path = path.as_ref();
        let media_type = declared_media_type(path, media_type);
        let bytes = tokio::fs::read(path).await.map_err(|e| read_error(path, e))?;
        Ok(Self::from_path(path, media_type, bytes))
    }

    /// Open a local file for `mode`, refusing it from metadata alone.
    ///
    /// Media type and on-disk size are checked in the same order as
    /// [`check`], so an oversized file is rejected without being read.
    pub async fn open_for(
        path: impl AsRef<Path>,
        media_type: Option<&str>,
        mode: ConversionMode,
        max_bytes: u64,
    ) -> Result<Self, DocSwapError> {
        let path = path.as_ref();
        let media_type = declared_media_type(path, media_type);
        let expected = mode.expected_media_type();
        if media_type != expected {
            return Err(ValidationError::WrongMediaType {
                expected,
                found: media_type,
            }
            .into());
        }
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| read_error(path, e))?
            .len();
        if size > max_bytes {
            return Err(ValidationError::TooLarge {
                size,
                limit: max_bytes,
            }
            .into());
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| read_error(path, e))?;
        let file = Self::from_path(path, media_type, bytes);
        // The file may have grown between stat and read.
        check(&file, mode, max_bytes)?;
        Ok(file)
    }

    fn from_path(path: &Path, media_type: String, bytes: Vec<u8>) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let file = Self::new(name, media_type, bytes);
        debug!(
            "Opened {} ({} bytes, {}) as {}",
            path.display(),
            file.size,
            file.media_type,
            file.id
        );
        file
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    /// Name, size and type without the content.
    pub fn summary(&self) -> FileSummary {
        FileSummary {
            name: self.name.clone(),
            size: self.size,
            media_type: self.media_type.clone(),
        }
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("size", &self.size)
            .finish()
    }
}

/// Displayable attributes of a [`SelectedFile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub size: u64,
    pub media_type: String,
}

fn declared_media_type(path: &Path, media_type: Option<&str>) -> String {
    media_type
        .map(str::to_string)
        .unwrap_or_else(|| media_type_for_path(path).to_string())
}

fn read_error(path: &Path, e: std::io::Error) -> DocSwapError {
    let path: PathBuf = path.to_path_buf();
    match e.kind() {
        std::io::ErrorKind::NotFound => DocSwapError::FileNotFound { path },
        std::io::ErrorKind::PermissionDenied => DocSwapError::PermissionDenied { path },
        _ => DocSwapError::ReadFailed { path, source: e },
    }
}

/// Accept `file` for `mode` with the default 5 MiB limit.
pub fn validate(file: &SelectedFile, mode: ConversionMode) -> bool {
    check(file, mode, MAX_UPLOAD_BYTES).is_ok()
}

/// Like [`validate`], but says why a file was refused.
///
/// Media type is checked first, then size against `max_bytes` (inclusive).
pub fn check(
    file: &SelectedFile,
    mode: ConversionMode,
    max_bytes: u64,
) -> Result<(), ValidationError> {
    let expected = mode.expected_media_type();
    if file.media_type() != expected {
        return Err(ValidationError::WrongMediaType {
            expected,
            found: file.media_type().to_string(),
        });
    }
    if file.size() > max_bytes {
        return Err(ValidationError::TooLarge {
            size: file.size(),
            limit: max_bytes,
        });
    }
    Ok(())
}
