//! Video ingestion orchestration: validate → stage → classify → remux → retire → put.

use clipvault_core::constants::{VIDEO_CONTENT_TYPE, VIDEO_EXTENSION};
use clipvault_core::error::{ErrorClass, ErrorMetadata, LogLevel};
use clipvault_core::media_type::is_media_type;
use clipvault_core::{Config, RetirementOrder, SignedAccess, StorageLocator};
use clipvault_storage::{make_key, ByteReader, Storage, StorageError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::probe::{Classifier, ClassifyError, FfprobeProber, MediaProber};
use super::remux::{remux_output_path, FfmpegRemuxer, RemuxError, Remuxer};
use super::scratch::{RemuxedAsset, StagedUpload};
use crate::tools::ToolError;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Upload exceeds the maximum size of {limit} bytes")]
    UploadTooLarge { limit: u64 },

    #[error("Failed to stage upload: {0}")]
    StageFailed(#[source] std::io::Error),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Remux(#[from] RemuxError),

    #[error("Failed to store video: {0}")]
    StoreFailed(#[source] StorageError),

    #[error("Failed to sign video URL: {0}")]
    SignFailed(#[source] StorageError),
}

impl ErrorMetadata for IngestError {
    fn error_class(&self) -> ErrorClass {
        match self {
            IngestError::UnsupportedMediaType(_) | IngestError::UploadTooLarge { .. } => {
                ErrorClass::Validation
            }
            IngestError::StageFailed(_) => ErrorClass::Internal,
            IngestError::Classify(e) => e.error_class(),
            IngestError::Remux(e) => e.error_class(),
            IngestError::StoreFailed(_) | IngestError::SignFailed(_) => ErrorClass::Storage,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            IngestError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            IngestError::UploadTooLarge { .. } => "UPLOAD_TOO_LARGE",
            IngestError::StageFailed(_) => "STAGE_FAILED",
            IngestError::Classify(e) => e.error_code(),
            IngestError::Remux(e) => e.error_code(),
            IngestError::StoreFailed(_) => "STORE_FAILED",
            IngestError::SignFailed(_) => "SIGN_FAILED",
        }
    }

    fn client_message(&self) -> String {
        match self {
            IngestError::UnsupportedMediaType(_) => {
                format!("Only {} uploads are accepted", VIDEO_CONTENT_TYPE)
            }
            IngestError::UploadTooLarge { .. } => self.to_string(),
            IngestError::Classify(e) => e.client_message(),
            IngestError::Remux(e) => e.client_message(),
            IngestError::StageFailed(_) => "Something went wrong while receiving the upload".to_string(),
            IngestError::StoreFailed(_) | IngestError::SignFailed(_) => {
                "Object storage is unavailable".to_string()
            }
        }
    }

    fn http_status_code(&self) -> u16 {
        match self {
            IngestError::UnsupportedMediaType(_) => 415,
            IngestError::UploadTooLarge { .. } => 413,
            _ => match self.error_class() {
                ErrorClass::Validation => 400,
                _ => 500,
            },
        }
    }
}

/// Settings for [`IngestOrchestrator`].
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Bucket new videos are stored in.
    pub bucket: String,
    /// Directory for staged uploads and remux output.
    pub scratch_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub signed_url_ttl: Duration,
    pub retirement_order: RetirementOrder,
}

impl IngestConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bucket: config.video_bucket().to_string(),
            scratch_dir: config.temp_dir.clone(),
            max_upload_bytes: config.max_video_size_bytes,
            signed_url_ttl: config.signed_url_ttl,
            retirement_order: config.retirement_order,
        }
    }
}

/// Moves one upload into object storage under an aspect-bucketed key.
///
/// Steps run strictly in sequence and the first failure aborts the ingestion. The
/// staged upload and the remux output are removed on every exit path. A prior object
/// is retired best-effort: a failed delete is logged and never fails the ingestion.
pub struct IngestOrchestrator {
    classifier: Classifier,
    remuxer: Arc<dyn Remuxer>,
    storage: Arc<dyn Storage>,
    config: IngestConfig,
}

impl IngestOrchestrator {
    pub fn new(
        prober: Arc<dyn MediaProber>,
        remuxer: Arc<dyn Remuxer>,
        storage: Arc<dyn Storage>,
        config: IngestConfig,
    ) -> Self {
        Self {
            classifier: Classifier::new(prober),
            remuxer,
            storage,
            config,
        }
    }

    /// Orchestrator using the configured ffprobe/ffmpeg binaries.
    pub fn from_config(config: &Config, storage: Arc<dyn Storage>) -> Result<Self, ToolError> {
        let prober = FfprobeProber::new(config.ffprobe_path.clone(), config.tool_timeout)?;
        let remuxer = FfmpegRemuxer::new(config.ffmpeg_path.clone(), config.tool_timeout)?;
        Ok(Self::new(
            Arc::new(prober),
            Arc::new(remuxer),
            storage,
            IngestConfig::from_config(config),
        ))
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest `upload` and return the locator of the newly stored object.
    ///
    /// `prior` is the locator currently held by the record, if any; it is deleted
    /// from storage as part of the ingestion.
    #[tracing::instrument(skip(self, upload), fields(bucket = %self.config.bucket))]
    pub async fn ingest(
        &self,
        upload: ByteReader,
        content_type: &str,
        prior: Option<&StorageLocator>,
    ) -> Result<StorageLocator, IngestError> {
        if !is_media_type(content_type, VIDEO_CONTENT_TYPE) {
            tracing::debug!(content_type = %content_type, "Rejected upload content type");
            return Err(IngestError::UnsupportedMediaType(content_type.to_string()));
        }

        let start = std::time::Instant::now();
        let staged = self.stage(upload).await?;

        let mut remuxed = None;
        let result = self.process(&staged, &mut remuxed, prior).await;

        if let Some(asset) = remuxed {
            asset.cleanup();
        }
        staged.cleanup();

        match &result {
            Ok(locator) => tracing::info!(
                bucket = %locator.bucket,
                key = %locator.key,
                duration_ms = start.elapsed().as_millis(),
                "Video ingestion completed"
            ),
            Err(e) => log_failure(e, start.elapsed()),
        }

        result
    }

    /// Signed read URL for a stored video. No locator means nothing to sign.
    pub async fn resolve_read_url(
        &self,
        locator: Option<&StorageLocator>,
    ) -> Result<Option<SignedAccess>, IngestError> {
        let Some(locator) = locator else {
            return Ok(None);
        };

        let access = self
            .storage
            .signed_read(&locator.bucket, &locator.key, self.config.signed_url_ttl)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %locator.bucket,
                    key = %locator.key,
                    "Failed to sign video URL"
                );
                IngestError::SignFailed(e)
            })?;

        Ok(Some(access))
    }

    async fn stage(&self, upload: ByteReader) -> Result<StagedUpload, IngestError> {
        let staged =
            StagedUpload::create_in(&self.config.scratch_dir).map_err(IngestError::StageFailed)?;

        match self.spool(upload, &staged).await {
            Ok(size) => {
                tracing::debug!(
                    path = %staged.path().display(),
                    size_bytes = size,
                    "Upload staged"
                );
                Ok(staged)
            }
            Err(e) => {
                staged.cleanup();
                Err(e)
            }
        }
    }

    async fn spool(&self, upload: ByteReader, staged: &StagedUpload) -> Result<u64, IngestError> {
        let limit = self.config.max_upload_bytes;
        let mut writer = staged.writer().map_err(IngestError::StageFailed)?;
        // One byte past the limit is enough to tell an oversized upload apart.
        let mut limited = upload.take(limit.saturating_add(1));

        let written = tokio::io::copy(&mut limited, &mut writer)
            .await
            .map_err(IngestError::StageFailed)?;
        writer.flush().await.map_err(IngestError::StageFailed)?;

        if written > limit {
            return Err(IngestError::UploadTooLarge { limit });
        }
        Ok(written)
    }

    async fn process(
        &self,
        staged: &StagedUpload,
        remuxed: &mut Option<RemuxedAsset>,
        prior: Option<&StorageLocator>,
    ) -> Result<StorageLocator, IngestError> {
        let aspect = self.classifier.classify(staged.path()).await?;

        // Owned before the remuxer runs so a partial output is removed on failure.
        let asset = remuxed.insert(RemuxedAsset::adopt(remux_output_path(staged.path())));
        let output = self.remuxer.remux(staged.path()).await?;
        if output != asset.path() {
            *asset = RemuxedAsset::adopt(output);
        }

        if self.config.retirement_order == RetirementOrder::BeforePut {
            if let Some(prior) = prior {
                self.retire(prior).await;
            }
        }

        let key = make_key(aspect, VIDEO_EXTENSION);
        let file = asset.open().await.map_err(IngestError::StageFailed)?;
        self.storage
            .put(&self.config.bucket, &key, Box::pin(file), VIDEO_CONTENT_TYPE)
            .await
            .map_err(IngestError::StoreFailed)?;

        let locator = StorageLocator::new(self.config.bucket.clone(), key);

        if self.config.retirement_order == RetirementOrder::AfterPut {
            if let Some(prior) = prior {
                self.retire(prior).await;
            }
        }

        Ok(locator)
    }

    async fn retire(&self, prior: &StorageLocator) {
        match self.storage.delete(&prior.bucket, &prior.key).await {
            Ok(()) => tracing::debug!(
                bucket = %prior.bucket,
                key = %prior.key,
                "Prior video retired"
            ),
            Err(StorageError::NotFound(_)) => tracing::warn!(
                bucket = %prior.bucket,
                key = %prior.key,
                "Prior video was already gone"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                bucket = %prior.bucket,
                key = %prior.key,
                "Failed to delete prior video"
            ),
        }
    }
}

fn log_failure(error: &IngestError, elapsed: Duration) {
    let duration_ms = elapsed.as_millis();
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, code, duration_ms, "Video ingestion rejected")
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, code, duration_ms, "Video ingestion failed")
        }
        LogLevel::Error => {
            tracing::error!(error = %error, code, duration_ms, "Video ingestion failed")
        }
    }
}
