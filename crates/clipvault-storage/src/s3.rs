use crate::traits::{expiry_from_now, validate_key, ByteReader, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use clipvault_core::SignedAccess;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::buffered::BufWriter;
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::{Attribute, Attributes, ObjectStoreExt, Result as ObjectResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Connection settings shared by every bucket client.
#[derive(Clone, Debug)]
pub struct S3Settings {
    pub region: String,
    /// Custom endpoint for S3-compatible providers
    /// (e.g. "http://localhost:9000" for MinIO)
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// S3 storage implementation
///
/// `object_store` clients are bound to one bucket, so one client per bucket is built
/// on first use and cached. Prior objects may live in a different bucket than the one
/// new uploads go to.
pub struct S3Storage {
    settings: S3Settings,
    stores: RwLock<HashMap<String, Arc<AmazonS3>>>,
}

impl S3Storage {
    /// Create a new S3Storage. The client for `default_bucket` is built eagerly so
    /// configuration errors surface at startup.
    pub fn new(settings: S3Settings, default_bucket: &str) -> StorageResult<Self> {
        let storage = S3Storage {
            settings,
            stores: RwLock::new(HashMap::new()),
        };
        storage.store_for(default_bucket)?;
        Ok(storage)
    }

    fn build_store(&self, bucket: &str) -> StorageResult<AmazonS3> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(self.settings.region.clone())
            .with_bucket_name(bucket);

        if let Some(ref endpoint) = self.settings.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }
        if let Some(ref access_key_id) = self.settings.access_key_id {
            builder = builder.with_access_key_id(access_key_id.clone());
        }
        if let Some(ref secret_access_key) = self.settings.secret_access_key {
            builder = builder.with_secret_access_key(secret_access_key.clone());
        }

        builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }

    fn store_for(&self, bucket: &str) -> StorageResult<Arc<AmazonS3>> {
        {
            let stores = self
                .stores
                .read()
                .map_err(|_| StorageError::BackendError("S3 client cache poisoned".to_string()))?;
            if let Some(store) = stores.get(bucket) {
                return Ok(Arc::clone(store));
            }
        }

        let store = Arc::new(self.build_store(bucket)?);
        let mut stores = self
            .stores
            .write()
            .map_err(|_| StorageError::BackendError("S3 client cache poisoned".to_string()))?;
        let store = stores.entry(bucket.to_string()).or_insert(store);
        tracing::debug!(bucket = %bucket, "S3 client created");
        Ok(Arc::clone(store))
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        mut reader: ByteReader,
        content_type: &str,
    ) -> StorageResult<()> {
        validate_key(bucket, key)?;
        let store: Arc<dyn object_store::ObjectStore> = self.store_for(bucket)?;
        let location = Path::from(key.to_string());
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());

        // Buffers up to one part in memory, switching to a multipart upload for
        // larger objects.
        let mut writer = BufWriter::new(store, location).with_attributes(attributes);

        let written = match tokio::io::copy(&mut reader, &mut writer).await {
            Ok(written) => written,
            Err(e) => {
                if let Err(abort_err) = writer.abort().await {
                    tracing::warn!(error = %abort_err, key = %key, "S3 multipart abort failed");
                }
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                return Err(StorageError::UploadFailed(e.to_string()));
            }
        };

        writer.shutdown().await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                size_bytes = written,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        validate_key(bucket, key)?;
        let store = self.store_for(bucket)?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 delete failed"
            );
            match e {
                object_store::Error::NotFound { .. } => StorageError::NotFound(key.to_string()),
                other => StorageError::DeleteFailed(other.to_string()),
            }
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn signed_read(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> StorageResult<SignedAccess> {
        validate_key(bucket, key)?;
        let store = self.store_for(bucket)?;
        let location = Path::from(key.to_string());
        let expires_at = expiry_from_now(ttl)?;

        let url_result: ObjectResult<_> = store.signed_url(Method::GET, &location, ttl).await;

        let url = url_result
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?
            .to_string();

        Ok(SignedAccess { url, expires_at })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
