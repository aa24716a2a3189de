use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::time::Duration;

/// Characters escaped in a key segment of a public URL. `/` is kept so nested
/// keys stay readable.
const KEY_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// An object to be written to the store
pub struct PutObject {
    pub key: String,
    pub data: Bytes,
    pub content_type: String,
    pub public: bool,
}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// All keys under `prefix`, in the store's listing order.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>>;
    async fn file_exists(&self, key: &str) -> Result<bool>;
    /// Creates or overwrites `object.key`.
    async fn upload_file(&self, object: PutObject) -> Result<()>;
    async fn generate_presigned_url(&self, key: &str, expires_in_secs: u64) -> Result<String>;
    /// Unsigned URL for an object that was stored public-read.
    fn public_url(&self, key: &str) -> String;
    /// Fails when the bucket is missing or unreachable.
    async fn check_bucket(&self) -> Result<()>;
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url,
        }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>> {
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let res = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token)
                .send()
                .await
                .with_context(|| format!("listing s3://{}/{}", self.bucket, prefix))?;

            if let Some(contents) = res.contents {
                for object in contents {
                    if let Some(key) = object.key {
                        objects.push(key);
                    }
                }
            }

            if res.is_truncated.unwrap_or(false) {
                continuation_token = res.next_continuation_token;
            } else {
                break;
            }
        }

        tracing::debug!("Listed {} objects under '{}'", objects.len(), prefix);
        Ok(objects)
    }

    async fn file_exists(&self, key: &str) -> Result<bool> {
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(anyhow::anyhow!(service_error))
                }
            }
        }
    }

    async fn upload_file(&self, object: PutObject) -> Result<()> {
        let size = object.data.len();
        let mut req = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&object.key)
            .content_type(&object.content_type)
            .body(ByteStream::from(object.data));

        if object.public {
            req = req.acl(ObjectCannedAcl::PublicRead);
        }

        req.send()
            .await
            .with_context(|| format!("writing s3://{}/{}", self.bucket, object.key))?;

        tracing::info!(
            "📦 Stored {} ({} bytes, {})",
            object.key,
            size,
            object.content_type
        );
        Ok(())
    }

    async fn generate_presigned_url(&self, key: &str, expires_in_secs: u64) -> Result<String> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(expires_in_secs))
            .context("invalid presigned URL expiry")?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .with_context(|| format!("signing s3://{}/{}", self.bucket, key))?;

        Ok(request.uri().to_string())
    }

    fn public_url(&self, key: &str) -> String {
        public_object_url(&self.public_base_url, &self.bucket, key)
    }

    async fn check_bucket(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .with_context(|| format!("probing bucket '{}'", self.bucket))?;
        Ok(())
    }
}

/// Path-style public URL: `{base}/{bucket}/{key}`.
pub fn public_object_url(base: &str, bucket: &str, key: &str) -> String {
    format!(
        "{}/{}/{}",
        base.trim_end_matches('/'),
        bucket,
        utf8_percent_encode(key, KEY_SEGMENT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_object_url() {
        assert_eq!(
            public_object_url("http://storage.example.com/", "skincam", "avatar/a.png"),
            "http://storage.example.com/skincam/avatar/a.png"
        );
        assert_eq!(
            public_object_url("http://localhost:9000", "skincam", "avatar/my face.jpg"),
            "http://localhost:9000/skincam/avatar/my%20face.jpg"
        );
    }
}
