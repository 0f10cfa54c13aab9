//! Video ingestion module

pub mod orchestration;
pub mod probe;
pub mod remux;
pub mod scratch;
pub mod service;

pub use orchestration::{IngestConfig, IngestError, IngestOrchestrator};
pub use probe::{Classifier, ClassifyError, FfprobeProber, MediaProber, StreamInfo};
pub use remux::{FfmpegRemuxer, RemuxError, Remuxer};
pub use scratch::{RemuxedAsset, StagedUpload};
pub use service::{UploadError, VideoUploadService};
