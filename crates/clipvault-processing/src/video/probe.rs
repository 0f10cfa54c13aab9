//! Stream probing and aspect classification.

use async_trait::async_trait;
use clipvault_core::error::{ErrorClass, ErrorMetadata};
use clipvault_core::AspectBucket;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

use crate::tools::{self, validate_tool_path, ToolError};

/// Classification failures. None of them are retryable for the same input.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("Probe failed: {0}")]
    ProbeFailed(String),

    #[error("Could not parse probe output: {0}")]
    ProbeParseFailed(String),

    #[error("No video stream found")]
    NoVideoStream,
}

impl From<ToolError> for ClassifyError {
    fn from(err: ToolError) -> Self {
        ClassifyError::ProbeFailed(err.to_string())
    }
}

impl ErrorMetadata for ClassifyError {
    fn error_class(&self) -> ErrorClass {
        ErrorClass::TransientTool
    }

    fn error_code(&self) -> &'static str {
        match self {
            ClassifyError::ProbeFailed(_) => "PROBE_FAILED",
            ClassifyError::ProbeParseFailed(_) => "PROBE_PARSE_FAILED",
            ClassifyError::NoVideoStream => "NO_VIDEO_STREAM",
        }
    }

    fn client_message(&self) -> String {
        match self {
            ClassifyError::NoVideoStream => "The uploaded file contains no video stream".to_string(),
            _ => "Something went wrong while processing the video".to_string(),
        }
    }
}

/// Geometry of the first video stream of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub codec_name: Option<String>,
}

/// Reads stream metadata from a local media file.
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<StreamInfo, ClassifyError>;
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Parse `ffprobe -print_format json -show_streams` output.
pub fn parse_probe_output(stdout: &[u8]) -> Result<StreamInfo, ClassifyError> {
    let output: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| ClassifyError::ProbeParseFailed(e.to_string()))?;

    let stream = output
        .streams
        .into_iter()
        .find(|s| s.codec_type.as_deref().is_none_or(|t| t == "video"))
        .ok_or(ClassifyError::NoVideoStream)?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) => Ok(StreamInfo {
            width,
            height,
            codec_name: stream.codec_name,
        }),
        _ => Err(ClassifyError::ProbeParseFailed(
            "video stream has no width/height".to_string(),
        )),
    }
}

/// [`MediaProber`] backed by the `ffprobe` binary.
pub struct FfprobeProber {
    ffprobe_path: String,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: String, timeout: Duration) -> Result<Self, ToolError> {
        validate_tool_path("ffprobe", &ffprobe_path)?;
        Ok(Self {
            ffprobe_path,
            timeout,
        })
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn probe(&self, path: &Path) -> Result<StreamInfo, ClassifyError> {
        let start = std::time::Instant::now();

        let mut command = Command::new(&self.ffprobe_path);
        command
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path);

        let stdout = tools::run("ffprobe", command, self.timeout).await?;
        let info = parse_probe_output(&stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            width = info.width,
            height = info.height,
            codec = info.codec_name.as_deref().unwrap_or("unknown"),
            "Video probe completed"
        );

        Ok(info)
    }
}

/// Assigns an [`AspectBucket`] to a staged video.
#[derive(Clone)]
pub struct Classifier {
    prober: Arc<dyn MediaProber>,
}

impl Classifier {
    pub fn new(prober: Arc<dyn MediaProber>) -> Self {
        Self { prober }
    }

    pub async fn classify(&self, path: &Path) -> Result<AspectBucket, ClassifyError> {
        let info = self.prober.probe(path).await?;
        let bucket = AspectBucket::from_dimensions(info.width, info.height);

        tracing::debug!(
            width = info.width,
            height = info.height,
            aspect = %bucket,
            "Video classified"
        );

        Ok(bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProber(u32, u32);

    #[async_trait]
    impl MediaProber for FixedProber {
        async fn probe(&self, _path: &Path) -> Result<StreamInfo, ClassifyError> {
            Ok(StreamInfo {
                width: self.0,
                height: self.1,
                codec_name: Some("h264".to_string()),
            })
        }
    }

    #[test]
    fn test_parse_ffprobe_output() {
        let json = br#"{
            "streams": [
                {"index": 0, "codec_name": "h264", "codec_type": "video", "width": 1920, "height": 1080}
            ]
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert_eq!(info.codec_name.as_deref(), Some("h264"));
    }

    #[test]
    fn test_parse_skips_non_video_streams() {
        let json = br#"{"streams": [
            {"codec_type": "audio", "codec_name": "aac"},
            {"codec_type": "video", "codec_name": "hevc", "width": 1080, "height": 1920}
        ]}"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!((info.width, info.height), (1080, 1920));
    }

    #[test]
    fn test_parse_empty_stream_list() {
        assert!(matches!(
            parse_probe_output(br#"{"streams": []}"#),
            Err(ClassifyError::NoVideoStream)
        ));
        assert!(matches!(
            parse_probe_output(b"{}"),
            Err(ClassifyError::NoVideoStream)
        ));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_probe_output(b"not json"),
            Err(ClassifyError::ProbeParseFailed(_))
        ));
        assert!(matches!(
            parse_probe_output(br#"{"streams": [{"codec_type": "video"}]}"#),
            Err(ClassifyError::ProbeParseFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_classifier_buckets() {
        let cases = [
            (1920, 1080, AspectBucket::Landscape),
            (1080, 1920, AspectBucket::Portrait),
            (1000, 1000, AspectBucket::Other),
        ];
        for (width, height, expected) in cases {
            let classifier = Classifier::new(Arc::new(FixedProber(width, height)));
            let bucket = classifier.classify(Path::new("/unused")).await.unwrap();
            assert_eq!(bucket, expected);
        }
    }

    #[test]
    fn test_rejects_unsafe_ffprobe_path() {
        assert!(FfprobeProber::new("ffprobe && rm".to_string(), Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_missing_ffprobe_is_probe_failed() {
        let prober = FfprobeProber::new(
            "/nonexistent/ffprobe".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        let result = prober.probe(Path::new("/tmp/whatever.mp4")).await;
        assert!(matches!(result, Err(ClassifyError::ProbeFailed(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ffprobe_script() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("ffprobe");
        std::fs::write(
            &script,
            "#!/bin/sh\necho '{\"streams\":[{\"codec_type\":\"video\",\"width\":720,\"height\":1280}]}'\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let prober = FfprobeProber::new(
            script.to_string_lossy().to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        let classifier = Classifier::new(Arc::new(prober));
        let bucket = classifier.classify(&dir.path().join("in.mp4")).await.unwrap();
        assert_eq!(bucket, AspectBucket::Portrait);
    }
}
