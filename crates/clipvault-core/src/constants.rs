//! Fixed values of the ingestion pipeline.

use std::time::Duration;

/// The only content type accepted for video uploads.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Extension given to every stored video object.
pub const VIDEO_EXTENSION: &str = "mp4";

/// Content types accepted for thumbnails, with the extension used on disk.
pub const THUMBNAIL_CONTENT_TYPES: &[(&str, &str)] = &[("image/jpeg", "jpg"), ("image/png", "png")];

/// Lifetime of a signed read URL unless configured otherwise.
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(5 * 60);

/// Separator of the `bucket,key` composite persisted on video records.
pub const LOCATOR_SEPARATOR: char = ',';
