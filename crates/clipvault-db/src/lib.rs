//! Clipvault metadata store
//!
//! The relational video store lives outside this workspace; this crate defines the
//! [`VideoRepository`] seam the pipeline needs from it, plus an in-memory
//! implementation for tests and local tooling.

pub mod memory;
pub mod repository;

pub use memory::InMemoryVideoRepository;
pub use repository::{RepositoryError, VideoRepository};
