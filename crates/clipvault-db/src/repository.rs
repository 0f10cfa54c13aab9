use async_trait::async_trait;
use clipvault_core::error::{ErrorClass, ErrorMetadata};
use clipvault_core::Video;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Video not found: {0}")]
    NotFound(Uuid),

    #[error("Metadata store error: {0}")]
    Backend(String),
}

impl ErrorMetadata for RepositoryError {
    fn error_class(&self) -> ErrorClass {
        match self {
            RepositoryError::NotFound(_) => ErrorClass::Validation,
            RepositoryError::Backend(_) => ErrorClass::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RepositoryError::NotFound(_) => "VIDEO_NOT_FOUND",
            RepositoryError::Backend(_) => "DATABASE_ERROR",
        }
    }

    fn client_message(&self) -> String {
        match self {
            RepositoryError::NotFound(_) => self.to_string(),
            RepositoryError::Backend(_) => "Metadata store is unavailable".to_string(),
        }
    }

    fn http_status_code(&self) -> u16 {
        match self {
            RepositoryError::NotFound(_) => 404,
            RepositoryError::Backend(_) => 500,
        }
    }
}

/// Video metadata access needed by the ingestion pipeline.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Fetch a video record, `None` if it does not exist.
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, RepositoryError>;

    /// Replace a stored record with `video`. Fails with `NotFound` for unknown ids.
    async fn update_video(&self, video: &Video) -> Result<(), RepositoryError>;
}
