pub mod aspect;
pub mod storage;
pub mod video;

pub use aspect::AspectBucket;
pub use storage::{LocatorError, SignedAccess, StorageLocator};
pub use video::{SignedVideo, Video};
