//! Thumbnail assets.
//!
//! Thumbnails are written as files under an assets directory that a static file
//! server exposes at `assets_base_url`.

use chrono::Utc;
use clipvault_core::constants::THUMBNAIL_CONTENT_TYPES;
use clipvault_core::error::{ErrorClass, ErrorMetadata};
use clipvault_core::media_type::essence;
use clipvault_core::{Config, Video};
use clipvault_db::{RepositoryError, VideoRepository};
use clipvault_storage::{random_token, ByteReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("Unsupported thumbnail type: {0}")]
    UnsupportedMediaType(String),

    #[error("Thumbnail exceeds the maximum size of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Video not found: {0}")]
    VideoNotFound(Uuid),

    #[error("Failed to write thumbnail: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ErrorMetadata for ThumbnailError {
    fn error_class(&self) -> ErrorClass {
        match self {
            ThumbnailError::UnsupportedMediaType(_)
            | ThumbnailError::TooLarge { .. }
            | ThumbnailError::VideoNotFound(_) => ErrorClass::Validation,
            ThumbnailError::Io(_) => ErrorClass::Internal,
            ThumbnailError::Repository(e) => e.error_class(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ThumbnailError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            ThumbnailError::TooLarge { .. } => "THUMBNAIL_TOO_LARGE",
            ThumbnailError::VideoNotFound(_) => "VIDEO_NOT_FOUND",
            ThumbnailError::Io(_) => "THUMBNAIL_WRITE_FAILED",
            ThumbnailError::Repository(e) => e.error_code(),
        }
    }

    fn client_message(&self) -> String {
        match self {
            ThumbnailError::Io(_) => "Something went wrong while saving the thumbnail".to_string(),
            ThumbnailError::Repository(e) => e.client_message(),
            _ => self.to_string(),
        }
    }

    fn http_status_code(&self) -> u16 {
        match self {
            ThumbnailError::UnsupportedMediaType(_) => 415,
            ThumbnailError::TooLarge { .. } => 413,
            ThumbnailError::VideoNotFound(_) => 404,
            ThumbnailError::Io(_) => 500,
            ThumbnailError::Repository(e) => e.http_status_code(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ThumbnailConfig {
    pub assets_root: PathBuf,
    pub assets_base_url: String,
    pub max_bytes: u64,
}

impl ThumbnailConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            assets_root: config.assets_root.clone(),
            assets_base_url: config.assets_base_url.clone(),
            max_bytes: config.max_thumbnail_size_bytes,
        }
    }
}

#[derive(Clone)]
pub struct ThumbnailService {
    repository: Arc<dyn VideoRepository>,
    config: ThumbnailConfig,
}

/// File extension for an accepted thumbnail content type.
fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = essence(content_type)?;
    THUMBNAIL_CONTENT_TYPES
        .iter()
        .find(|(media_type, _)| *media_type == essence)
        .map(|(_, extension)| *extension)
}

impl ThumbnailService {
    pub fn new(repository: Arc<dyn VideoRepository>, config: ThumbnailConfig) -> Self {
        Self { repository, config }
    }

    /// Store `upload` as the thumbnail of `video_id` and return the updated record.
    #[tracing::instrument(skip(self, upload), fields(video_id = %video_id))]
    pub async fn upload_thumbnail(
        &self,
        video_id: Uuid,
        upload: ByteReader,
        content_type: &str,
    ) -> Result<Video, ThumbnailError> {
        let extension = extension_for(content_type)
            .ok_or_else(|| ThumbnailError::UnsupportedMediaType(content_type.to_string()))?;

        let mut video = self
            .repository
            .get_video(video_id)
            .await?
            .ok_or(ThumbnailError::VideoNotFound(video_id))?;

        tokio::fs::create_dir_all(&self.config.assets_root).await?;

        let file_name = format!("{}.{}", random_token(), extension);
        let path = self.config.assets_root.join(&file_name);
        // Removed on any early return below, including a failed record update.
        let guard = TempPath::from_path(&path);

        let size = write_limited(upload, &path, self.config.max_bytes).await?;

        video.thumbnail_url = Some(format!(
            "{}/{}",
            self.config.assets_base_url.trim_end_matches('/'),
            file_name
        ));
        video.updated_at = Utc::now();
        self.repository.update_video(&video).await?;

        guard.keep().map_err(|e| ThumbnailError::Io(e.error))?;

        tracing::info!(
            path = %path.display(),
            size_bytes = size,
            "Thumbnail stored"
        );

        Ok(video)
    }
}

async fn write_limited(upload: ByteReader, path: &Path, limit: u64) -> Result<u64, ThumbnailError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut limited = upload.take(limit.saturating_add(1));
    let written = tokio::io::copy(&mut limited, &mut file).await?;
    file.flush().await?;

    if written > limit {
        return Err(ThumbnailError::TooLarge { limit });
    }
    Ok(written)
}
