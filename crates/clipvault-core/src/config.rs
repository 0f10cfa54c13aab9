//! Configuration module
//!
//! Storage, external tool and ingestion settings, read from the environment (and an
//! optional `.env` file).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const MAX_VIDEO_SIZE_MB: u64 = 1024;
const MAX_THUMBNAIL_SIZE_MB: u64 = 10;
const SIGNED_URL_TTL_SECS: u64 = 300;
const TOOL_TIMEOUT_SECS: u64 = 600;
const ASSETS_ROOT: &str = "./assets";
const ASSETS_BASE_URL: &str = "http://localhost:8091/assets";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// When the previously stored object is deleted relative to the new put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetirementOrder {
    /// Delete the prior object, then store the new one.
    #[default]
    BeforePut,
    /// Store the new object first; the prior one stays readable until then.
    AfterPut,
}

impl FromStr for RetirementOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "before_put" => Ok(RetirementOrder::BeforePut),
            "after_put" => Ok(RetirementOrder::AfterPut),
            other => Err(format!("expected before_put or after_put, got {}", other)),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub local_signing_secret: Option<String>,
    // External tools
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub tool_timeout: Duration,
    // Ingestion
    pub temp_dir: PathBuf,
    pub max_video_size_bytes: u64,
    pub max_thumbnail_size_bytes: u64,
    pub signed_url_ttl: Duration,
    pub retirement_order: RetirementOrder,
    // Thumbnail assets
    pub assets_root: PathBuf,
    pub assets_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(value) => value.parse().map_err(|e: anyhow::Error| ConfigError::Invalid {
                name: "STORAGE_BACKEND",
                value,
                reason: e.to_string(),
            })?,
            None => StorageBackend::S3,
        };

        let retirement_order = match var("RETIREMENT_ORDER") {
            Some(value) => value.parse().map_err(|reason| ConfigError::Invalid {
                name: "RETIREMENT_ORDER",
                value,
                reason,
            })?,
            None => RetirementOrder::default(),
        };

        let config = Config {
            environment: var("ENVIRONMENT")
                .or_else(|| var("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
            storage_backend,
            s3_bucket: var("S3_BUCKET"),
            s3_region: var("S3_REGION").or_else(|| var("AWS_REGION")),
            s3_endpoint: var("S3_ENDPOINT"),
            aws_access_key_id: var("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL"),
            local_signing_secret: var("LOCAL_SIGNING_SECRET"),
            ffmpeg_path: var("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            ffprobe_path: var("FFPROBE_PATH").unwrap_or_else(|| "ffprobe".to_string()),
            tool_timeout: Duration::from_secs(parse_u64(
                var("TOOL_TIMEOUT_SECS"),
                "TOOL_TIMEOUT_SECS",
                TOOL_TIMEOUT_SECS,
            )?),
            temp_dir: var("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            max_video_size_bytes: parse_megabytes(
                var("MAX_VIDEO_SIZE_MB"),
                "MAX_VIDEO_SIZE_MB",
                MAX_VIDEO_SIZE_MB,
            )?,
            max_thumbnail_size_bytes: parse_megabytes(
                var("MAX_THUMBNAIL_SIZE_MB"),
                "MAX_THUMBNAIL_SIZE_MB",
                MAX_THUMBNAIL_SIZE_MB,
            )?,
            signed_url_ttl: Duration::from_secs(parse_u64(
                var("SIGNED_URL_TTL_SECS"),
                "SIGNED_URL_TTL_SECS",
                SIGNED_URL_TTL_SECS,
            )?),
            retirement_order,
            assets_root: var("ASSETS_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(ASSETS_ROOT)),
            assets_base_url: var("ASSETS_BASE_URL")
                .unwrap_or_else(|| ASSETS_BASE_URL.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that the selected storage backend has everything it needs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(ConfigError::Missing("S3_BUCKET"));
                }
                if self.s3_region.is_none() {
                    return Err(ConfigError::Missing("S3_REGION or AWS_REGION"));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(ConfigError::Missing("LOCAL_STORAGE_PATH"));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(ConfigError::Missing("LOCAL_STORAGE_BASE_URL"));
                }
                if self.local_signing_secret.is_none() {
                    return Err(ConfigError::Missing("LOCAL_SIGNING_SECRET"));
                }
            }
        }

        if self.signed_url_ttl.is_zero() {
            return Err(ConfigError::Invalid {
                name: "SIGNED_URL_TTL_SECS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    /// Bucket new videos are stored in. For the local backend this is a directory
    /// under the storage root.
    pub fn video_bucket(&self) -> &str {
        self.s3_bucket.as_deref().unwrap_or("videos")
    }
}

/// Parse a size in MiB and return it in bytes.
fn parse_megabytes(
    value: Option<String>,
    name: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    let raw = value.clone();
    let megabytes = parse_u64(value, name, default)?;
    megabytes
        .checked_mul(1024 * 1024)
        .ok_or_else(|| ConfigError::Invalid {
            name,
            value: raw.unwrap_or_else(|| default.to_string()),
            reason: "size in bytes does not fit in 64 bits".to_string(),
        })
}

fn parse_u64(value: Option<String>, name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::Invalid {
                name,
                value,
                reason: e.to_string(),
            }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_s3_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("S3_BUCKET", "tubes"),
            ("AWS_REGION", "us-east-1"),
        ]))
        .unwrap();

        assert_eq!(config.storage_backend, StorageBackend::S3);
        assert_eq!(config.video_bucket(), "tubes");
        assert_eq!(config.s3_region.as_deref(), Some("us-east-1"));
        assert_eq!(config.signed_url_ttl, Duration::from_secs(300));
        assert_eq!(config.tool_timeout, Duration::from_secs(600));
        assert_eq!(config.max_video_size_bytes, 1 << 30);
        assert_eq!(config.max_thumbnail_size_bytes, 10 << 20);
        assert_eq!(config.ffmpeg_path, "ffmpeg");
        assert_eq!(config.ffprobe_path, "ffprobe");
        assert_eq!(config.retirement_order, RetirementOrder::BeforePut);
        assert!(!config.is_production());
    }

    #[test]
    fn test_s3_requires_bucket_and_region() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("AWS_REGION", "us-east-1")])),
            Err(ConfigError::Missing("S3_BUCKET"))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("S3_BUCKET", "tubes")])),
            Err(ConfigError::Missing(_))
        ));
    }

    #[test]
    fn test_local_backend() {
        let config = Config::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/clipvault"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:8091/media"),
            ("LOCAL_SIGNING_SECRET", "secret"),
            ("RETIREMENT_ORDER", "after_put"),
            ("SIGNED_URL_TTL_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.storage_backend, StorageBackend::Local);
        assert_eq!(config.video_bucket(), "videos");
        assert_eq!(config.retirement_order, RetirementOrder::AfterPut);
        assert_eq!(config.signed_url_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_local_backend_requires_secret() {
        let result = Config::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/clipvault"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:8091/media"),
        ]));
        assert!(matches!(result, Err(ConfigError::Missing("LOCAL_SIGNING_SECRET"))));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let result = Config::from_lookup(lookup(&[
            ("S3_BUCKET", "tubes"),
            ("AWS_REGION", "us-east-1"),
            ("TOOL_TIMEOUT_SECS", "soon"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "TOOL_TIMEOUT_SECS",
                ..
            })
        ));

        let result = Config::from_lookup(lookup(&[
            ("S3_BUCKET", "tubes"),
            ("AWS_REGION", "us-east-1"),
            ("SIGNED_URL_TTL_SECS", "0"),
        ]));
        assert!(result.is_err());

        let result = Config::from_lookup(lookup(&[("STORAGE_BACKEND", "nfs")]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "STORAGE_BACKEND",
                ..
            })
        ));
    }

    #[test]
    fn test_oversized_limits_are_rejected() {
        for name in ["MAX_VIDEO_SIZE_MB", "MAX_THUMBNAIL_SIZE_MB"] {
            let result = Config::from_lookup(lookup(&[
                ("S3_BUCKET", "tubes"),
                ("AWS_REGION", "us-east-1"),
                (name, "18446744073709551615"),
            ]));
            match result {
                Err(ConfigError::Invalid { name: got, .. }) => assert_eq!(got, name),
                other => panic!("expected Invalid for {}, got {:?}", name, other.map(|_| ())),
            }
        }

        let config = Config::from_lookup(lookup(&[
            ("S3_BUCKET", "tubes"),
            ("AWS_REGION", "us-east-1"),
            ("MAX_VIDEO_SIZE_MB", "2048"),
        ]))
        .unwrap();
        assert_eq!(config.max_video_size_bytes, 2048 * 1024 * 1024);
    }
}
