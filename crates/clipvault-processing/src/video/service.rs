//! Binds ingestion to video records.

use clipvault_core::error::{ErrorClass, ErrorMetadata};
use clipvault_core::{LocatorError, SignedVideo, Video};
use clipvault_db::{RepositoryError, VideoRepository};
use clipvault_storage::ByteReader;
use std::sync::Arc;
use uuid::Uuid;

use super::orchestration::{IngestError, IngestOrchestrator};

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Video not found: {0}")]
    VideoNotFound(Uuid),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Stored video locator is invalid: {0}")]
    InvalidLocator(#[from] LocatorError),
}

impl ErrorMetadata for UploadError {
    fn error_class(&self) -> ErrorClass {
        match self {
            UploadError::VideoNotFound(_) => ErrorClass::Validation,
            UploadError::InvalidLocator(_) => ErrorClass::Internal,
            UploadError::Repository(e) => e.error_class(),
            UploadError::Ingest(e) => e.error_class(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            UploadError::VideoNotFound(_) => "VIDEO_NOT_FOUND",
            UploadError::Repository(e) => e.error_code(),
            UploadError::Ingest(e) => e.error_code(),
            UploadError::InvalidLocator(_) => "INVALID_LOCATOR",
        }
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::VideoNotFound(_) => self.to_string(),
            UploadError::InvalidLocator(_) => "Stored video record is corrupt".to_string(),
            UploadError::Repository(e) => e.client_message(),
            UploadError::Ingest(e) => e.client_message(),
        }
    }

    fn http_status_code(&self) -> u16 {
        match self {
            UploadError::VideoNotFound(_) => 404,
            UploadError::Repository(e) => e.http_status_code(),
            UploadError::Ingest(e) => e.http_status_code(),
            UploadError::InvalidLocator(_) => 500,
        }
    }
}

/// Video upload and read operations over the metadata store.
///
/// Concurrent uploads for the same video are not coordinated; the last record
/// update wins and the loser's object is orphaned.
#[derive(Clone)]
pub struct VideoUploadService {
    repository: Arc<dyn VideoRepository>,
    orchestrator: Arc<IngestOrchestrator>,
}

impl VideoUploadService {
    pub fn new(repository: Arc<dyn VideoRepository>, orchestrator: Arc<IngestOrchestrator>) -> Self {
        Self {
            repository,
            orchestrator,
        }
    }

    /// Replace the video file of `video_id` with `upload`.
    #[tracing::instrument(skip(self, upload), fields(video_id = %video_id))]
    pub async fn upload_video(
        &self,
        video_id: Uuid,
        upload: ByteReader,
        content_type: &str,
    ) -> Result<SignedVideo, UploadError> {
        let mut video = self.load(video_id).await?;

        let prior = match video.locator() {
            Ok(prior) => prior,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    video_url = video.video_url.as_deref().unwrap_or_default(),
                    "Ignoring malformed stored locator"
                );
                None
            }
        };

        let locator = self
            .orchestrator
            .ingest(upload, content_type, prior.as_ref())
            .await?;

        video.set_locator(&locator);
        self.repository.update_video(&video).await?;

        tracing::info!(
            bucket = %locator.bucket,
            key = %locator.key,
            "Video record updated"
        );

        self.sign_video(video).await
    }

    /// Fetch a video with a freshly signed `video_url`.
    pub async fn get_video(&self, video_id: Uuid) -> Result<SignedVideo, UploadError> {
        let video = self.load(video_id).await?;
        self.sign_video(video).await
    }

    /// Swap the stored locator of `video` for a signed read URL.
    pub async fn sign_video(&self, video: Video) -> Result<SignedVideo, UploadError> {
        let locator = video.locator()?;
        let access = self
            .orchestrator
            .resolve_read_url(locator.as_ref())
            .await?;
        Ok(SignedVideo::new(video, access))
    }

    async fn load(&self, video_id: Uuid) -> Result<Video, UploadError> {
        self.repository
            .get_video(video_id)
            .await?
            .ok_or(UploadError::VideoNotFound(video_id))
    }
}
