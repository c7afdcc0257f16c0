use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::debug;

use super::TiffSink;
use crate::error::IoError;

/// Content type recorded on uploaded objects.
const TIFF_CONTENT_TYPE: &str = "image/tiff";

/// Uploads files to S3 or S3-compatible storage (MinIO, etc.).
///
/// Each file is written with a single `PutObject` request under
/// `prefix + name`.
#[derive(Clone)]
pub struct S3Sink {
    client: Client,
    bucket: String,
    prefix: String,
    identifier: String,
}

impl S3Sink {
    /// Sink writing to `bucket`, with keys prefixed by `prefix` (may be empty).
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        let bucket = bucket.into();
        let prefix = prefix.into();
        let identifier = format!("s3://{}/{}", bucket, prefix);
        Self {
            client,
            bucket,
            prefix,
            identifier,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key used for `name`.
    pub fn key_for(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }
}

#[async_trait]
impl TiffSink for S3Sink {
    async fn store(&self, name: &str, data: Bytes) -> Result<(), IoError> {
        let key = self.key_for(name);
        let size = data.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(TIFF_CONTENT_TYPE)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                if matches!(e, SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)) {
                    return IoError::Connection(e.to_string());
                }

                let err_str = e.to_string();
                let code = e.as_service_error().and_then(|se| se.meta().code());
                if code == Some("NoSuchBucket") || err_str.contains("NoSuchBucket") {
                    return IoError::NotFound(format!("s3://{}", self.bucket));
                }

                IoError::S3(err_str)
            })?;

        debug!(bucket = %self.bucket, key = %key, size, "Uploaded object");
        Ok(())
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// Create an S3 client with optional custom endpoint and region.
///
/// Use a custom endpoint for S3-compatible services like MinIO:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), "us-east-1").await;
/// ```
pub async fn create_s3_client(endpoint_url: Option<&str>, region: &str) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }

    let sdk_config = loader.load().await;

    // Custom endpoints are addressed path-style
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(endpoint_url.is_some())
        .build();

    Client::from_conf(s3_config)
}
