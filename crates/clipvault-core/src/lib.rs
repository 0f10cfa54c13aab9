//! Clipvault Core Library
//!
//! Domain models, configuration, error metadata and content-type helpers shared by
//! every clipvault crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod media_type;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, ConfigError, RetirementOrder};
pub use error::{ErrorClass, ErrorMetadata, LogLevel};
pub use models::{AspectBucket, LocatorError, SignedAccess, SignedVideo, StorageLocator, Video};
pub use storage_types::StorageBackend;
