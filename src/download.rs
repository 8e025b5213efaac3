//! Save-as download of converted documents.
//!
//! [`DownloadSink`] is where converted bytes go once a transaction succeeds.
//! The CLI uses [`DirectorySink`]; a GUI would implement the trait with its
//! own save dialog.

use crate::error::TransactionError;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Offers named bytes to the user.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Store `bytes` under `file_name`; returns where they ended up.
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, TransactionError>;
}

/// Writes downloads into a directory.
///
/// Uses atomic write (temp file in the same directory + rename) so a failed
/// save never leaves a partial file behind. Only the final path component of
/// `file_name` is used.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, TransactionError> {
        let leaf = Path::new(file_name)
            .file_name()
            .map(PathBuf::from)
            .ok_or_else(|| {
                TransactionError::InvalidRequest(format!("unusable download name '{file_name}'"))
            })?;
        let dir = self.dir.clone();
        let target = dir.join(leaf);
        let bytes = bytes.to_vec();

        let saved = tokio::task::spawn_blocking(move || write_atomically(&dir, &target, &bytes))
            .await
            .map_err(|e| TransactionError::SaveFailed {
                path: self.dir.join(file_name),
                source: std::io::Error::other(e.to_string()),
            })??;

        info!("Saved {}", saved.display());
        Ok(saved)
    }
}

fn write_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> Result<PathBuf, TransactionError> {
    let save_failed = |source: std::io::Error| TransactionError::SaveFailed {
        path: target.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(save_failed)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(save_failed)?;
    tmp.write_all(bytes).map_err(save_failed)?;
    tmp.as_file().sync_all().map_err(save_failed)?;
    tmp.persist(target).map_err(|e| save_failed(e.error))?;
    Ok(target.to_path_buf())
}
