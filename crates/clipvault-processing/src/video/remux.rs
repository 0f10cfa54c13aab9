//! Faststart remuxing.
//!
//! Rewrites an MP4 so the `moov` atom sits ahead of the media data, letting players
//! start before the whole file is downloaded. Streams are copied, not re-encoded.

use async_trait::async_trait;
use clipvault_core::error::{ErrorClass, ErrorMetadata};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::tools::{self, validate_tool_path, ToolError};

const OUTPUT_SUFFIX: &str = ".processing";

#[derive(Debug, thiserror::Error)]
pub enum RemuxError {
    #[error("Remux failed: {0}")]
    RemuxFailed(String),
}

impl From<ToolError> for RemuxError {
    fn from(err: ToolError) -> Self {
        RemuxError::RemuxFailed(err.to_string())
    }
}

impl ErrorMetadata for RemuxError {
    fn error_class(&self) -> ErrorClass {
        ErrorClass::TransientTool
    }

    fn error_code(&self) -> &'static str {
        "REMUX_FAILED"
    }

    fn client_message(&self) -> String {
        "Something went wrong while processing the video".to_string()
    }
}

/// Produces a progressive-download friendly copy of a staged video.
#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Remux `input` into [`remux_output_path`] and return that path. The input is left
    /// in place.
    ///
    /// The caller owns the output path: on error a partial file may exist there and it
    /// is the caller's job to remove it.
    async fn remux(&self, input: &Path) -> Result<PathBuf, RemuxError>;
}

/// Output location for a remux of `input`: the input path with `.processing` appended.
pub fn remux_output_path(input: &Path) -> PathBuf {
    let mut name: OsString = input.as_os_str().to_owned();
    name.push(OUTPUT_SUFFIX);
    PathBuf::from(name)
}

/// [`Remuxer`] backed by the `ffmpeg` binary.
pub struct FfmpegRemuxer {
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: String, timeout: Duration) -> Result<Self, ToolError> {
        validate_tool_path("ffmpeg", &ffmpeg_path)?;
        Ok(Self {
            ffmpeg_path,
            timeout,
        })
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn remux(&self, input: &Path) -> Result<PathBuf, RemuxError> {
        let start = std::time::Instant::now();
        let output = remux_output_path(input);

        let mut command = Command::new(&self.ffmpeg_path);
        command
            .args(["-v", "error", "-y", "-i"])
            .arg(input)
            .args(["-c", "copy", "-movflags", "+faststart", "-f", "mp4"])
            .arg(&output);

        if let Err(e) = tools::run("ffmpeg", command, self.timeout).await {
            tracing::error!(
                error = %e,
                duration_ms = start.elapsed().as_millis(),
                "Faststart remux failed"
            );
            return Err(e.into());
        }

        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(RemuxError::RemuxFailed(
                "ffmpeg exited successfully but produced no output".to_string(),
            ));
        }

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            output = %output.display(),
            "Faststart remux completed"
        );

        Ok(output)
    }
}
