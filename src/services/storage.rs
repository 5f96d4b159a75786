use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

/// Object store used for source CSV backups and question images.
///
/// Keys are opaque ids; the bucket selects the concern (source-files or
/// question-images).
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;
    async fn delete_file(&self, bucket: &str, key: &str) -> Result<()>;
    async fn file_exists(&self, bucket: &str, key: &str) -> Result<bool>;
    /// Public view URL for an object. Pure string construction, no I/O.
    fn get_view_url(&self, bucket: &str, key: &str) -> String;
}

pub struct S3StorageService {
    client: Client,
    /// Path-style public base, typically the MinIO/S3 endpoint URL.
    public_base_url: String,
}

impl S3StorageService {
    pub fn new(client: Client, public_base_url: String) -> Self {
        Self {
            client,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await?;
        Ok(())
    }

    async fn delete_file(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;
        Ok(())
    }

    async fn file_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let res = self
            .client
            .head_object()
            .bucket(bucket)
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

    fn get_view_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, bucket, key)
    }
}
