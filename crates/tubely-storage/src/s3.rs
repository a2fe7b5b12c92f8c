use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    conditional_put: bool,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `conditional_put` - Send `If-None-Match: *` so an existing key is never replaced
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        conditional_put: bool,
    ) -> StorageResult<Self> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(ref endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }

        Ok(S3Storage {
            client: Client::from_conf(builder.build()),
            bucket,
            region,
            endpoint_url,
            conditional_put,
        })
    }
}

/// Public URL for an S3 object
///
/// For AWS S3: `https://{bucket}.s3.{region}.amazonaws.com/{key}`.
/// For S3-compatible providers the endpoint is used path-style:
/// `{endpoint}/{bucket}/{key}`.
pub fn public_object_url(bucket: &str, region: &str, endpoint_url: Option<&str>, key: &str) -> String {
    match endpoint_url {
        Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
        None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key),
    }
}

#[async_trait]
impl Storage for S3Storage {
    #[tracing::instrument(skip(self, path), fields(bucket = %self.bucket, key = %key))]
    async fn upload_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        let size_bytes = tokio::fs::metadata(path).await?.len();
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Failed to open upload body: {}", e)))?;

        let start = std::time::Instant::now();

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(body);
        if self.conditional_put {
            request = request.if_none_match("*");
        }

        if let Err(e) = request.send().await {
            let status = e.raw_response().map(|r| r.status().as_u16());
            tracing::error!(
                error = %DisplayErrorContext(&e),
                status = ?status,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size_bytes,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            if status == Some(412) {
                return Err(StorageError::AlreadyExists(key.to_string()));
            }
            return Err(StorageError::UploadFailed(
                DisplayErrorContext(&e).to_string(),
            ));
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        public_object_url(&self.bucket, &self.region, self.endpoint_url.as_deref(), key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
