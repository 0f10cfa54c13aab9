//! Clipvault Media Processing Library
//!
//! The video ingestion pipeline: probing and aspect classification, faststart remuxing,
//! the ingestion orchestrator that moves an upload into object storage, the upload
//! service binding it to video records, and thumbnail asset handling.

pub mod thumbnail;
pub mod tools;
pub mod video;

// Re-export commonly used types
pub use thumbnail::{ThumbnailConfig, ThumbnailError, ThumbnailService};
pub use tools::ToolError;
pub use video::{
    Classifier, ClassifyError, FfmpegRemuxer, FfprobeProber, IngestConfig, IngestError,
    IngestOrchestrator, MediaProber, RemuxError, RemuxedAsset, Remuxer, StagedUpload,
    StreamInfo, UploadError, VideoUploadService,
};
