//! Clipvault Storage Library
//!
//! Object store gateway for clipvault: the [`Storage`] trait plus S3 and local
//! filesystem backends, and the key generator that names stored videos.
//!
//! # Storage key format
//!
//! Video keys are `{aspect}/{token}.{extension}` where `aspect` is one of `landscape`,
//! `portrait` or `other` and `token` is 32 random bytes, base64url without padding.
//! Keys must not contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use clipvault_core::StorageBackend;
pub use factory::create_storage;
pub use keys::{make_key, random_token};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::{S3Settings, S3Storage};
pub use traits::{ByteReader, Storage, StorageError, StorageResult};
