//! Storage locator model: where a stored video lives, and how it is read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::constants::LOCATOR_SEPARATOR;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    #[error("Storage locator must have the form `bucket,key`, got {0:?}")]
    Malformed(String),
}

/// A `(bucket, key)` pair identifying exactly one stored object.
///
/// Persisted on video records as the composite string `bucket,key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageLocator {
    pub bucket: String,
    pub key: String,
}

impl StorageLocator {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl Display for StorageLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}{}{}", self.bucket, LOCATOR_SEPARATOR, self.key)
    }
}

impl FromStr for StorageLocator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(LOCATOR_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(bucket), Some(key), None) if !bucket.is_empty() && !key.is_empty() => {
                Ok(StorageLocator::new(bucket, key))
            }
            _ => Err(LocatorError::Malformed(s.to_string())),
        }
    }
}

/// A time-limited read URL for one stored object. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAccess {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}
