//! S3-backed blob store for avatars and listing images

use async_trait::async_trait;
use aws_sdk_s3::{Client, primitives::ByteStream};
use listings::error::{RemoteError, RemoteResult};
use listings::remote::{BlobStore, Upload};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct S3BlobStore {
    s3_client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3BlobStore {
    pub fn new(s3_client: Client, bucket: String, public_base_url: String) -> Self {
        Self {
            s3_client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn object_key(prefix: &str) -> String {
        format!("{}/{}", prefix.trim_matches('/'), Uuid::new_v4())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(&self, prefix: &str, upload: Upload) -> RemoteResult<String> {
        let key = Self::object_key(prefix);
        let size = upload.bytes.len();

        self.s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(upload.bytes))
            .content_type(upload.content_type)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to upload {} to bucket {}: {}", key, self.bucket, e);
                RemoteError::Unavailable(e.to_string())
            })?;

        info!("Uploaded {} bytes to {}", size, key);
        Ok(self.public_url(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_is_prefixed_and_unique() {
        let first = S3BlobStore::object_key("users");
        let second = S3BlobStore::object_key("/users/");

        assert!(first.starts_with("users/"));
        assert!(second.starts_with("users/"));
        assert_ne!(first, second);
        assert!(Uuid::parse_str(&first["users/".len()..]).is_ok());
    }
}
