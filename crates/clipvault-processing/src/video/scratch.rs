//! Scratch files for an in-flight ingestion.
//!
//! Both types delete their file when dropped, so every exit path of the pipeline
//! (errors and panics included) leaves the scratch directory clean. `cleanup` does the
//! same explicitly and logs anything that went wrong.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};

const UPLOAD_PREFIX: &str = "clipvault-upload-";

/// The raw upload, spooled to local disk.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
}

impl StagedUpload {
    /// Create an empty, uniquely named staging file in `dir`.
    pub fn create_in(dir: &Path) -> io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(UPLOAD_PREFIX)
            .suffix(".mp4")
            .tempfile_in(dir)?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Async handle for spooling the upload into the staging file.
    pub fn writer(&self) -> io::Result<tokio::fs::File> {
        let file = self.file.as_file().try_clone()?;
        Ok(tokio::fs::File::from_std(file))
    }

    pub fn cleanup(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn_cleanup_failed(&path, &e);
        }
    }
}

/// Output of the faststart remux. Owns the file from the moment the remuxer returns.
#[derive(Debug)]
pub struct RemuxedAsset {
    path: TempPath,
}

impl RemuxedAsset {
    pub fn adopt(path: PathBuf) -> Self {
        Self {
            path: TempPath::from_path(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn open(&self) -> io::Result<tokio::fs::File> {
        tokio::fs::File::open(&self.path).await
    }

    pub fn cleanup(self) {
        let path = self.path.to_path_buf();
        if let Err(e) = self.path.close() {
            warn_cleanup_failed(&path, &e);
        }
    }
}

fn warn_cleanup_failed(path: &Path, error: &io::Error) {
    if error.kind() != io::ErrorKind::NotFound {
        tracing::warn!(
            error = %error,
            path = %path.display(),
            "Failed to remove scratch file"
        );
    }
}
