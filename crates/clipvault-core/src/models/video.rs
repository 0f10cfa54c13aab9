use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::storage::{LocatorError, SignedAccess, StorageLocator};

/// Video metadata record as held by the metadata store.
///
/// `video_url` stores the `bucket,key` composite of the uploaded object, not a
/// playable URL. Readers get a [`SignedVideo`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn new(user_id: Uuid, title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: description.into(),
            thumbnail_url: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Parsed storage locator, `Ok(None)` when no video was uploaded yet.
    pub fn locator(&self) -> Result<Option<StorageLocator>, LocatorError> {
        self.video_url.as_deref().map(str::parse).transpose()
    }

    /// Replace the stored locator. The previous value is superseded, never merged.
    pub fn set_locator(&mut self, locator: &StorageLocator) {
        self.video_url = Some(locator.to_string());
        self.updated_at = Utc::now();
    }
}

/// A video record ready to hand to a reader: `video_url` is a signed URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedVideo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SignedVideo {
    pub fn new(video: Video, access: Option<SignedAccess>) -> Self {
        let (video_url, video_url_expires_at) = match access {
            Some(access) => (Some(access.url), Some(access.expires_at)),
            None => (None, None),
        };

        SignedVideo {
            id: video.id,
            user_id: video.user_id,
            title: video.title,
            description: video.description,
            thumbnail_url: video.thumbnail_url,
            video_url,
            video_url_expires_at,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}
