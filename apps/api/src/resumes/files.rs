use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;

/// Holds uploaded documents by storage key.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn put(&self, key: &str, content_type: &str, bytes: Bytes) -> Result<(), AppError>;

    async fn get(&self, key: &str) -> Result<Bytes, AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// `resumes/{user_id}/{uuid}_{name}` with the name reduced to `[A-Za-z0-9.-]`.
pub fn storage_key(user_id: uuid::Uuid, file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("resumes/{}/{}_{}", user_id, uuid::Uuid::new_v4(), sanitized)
}

// ---------------------------------------------------------------------------
// S3 / MinIO
// ---------------------------------------------------------------------------

pub struct S3FileStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3FileStore {
    /// Constructs a client configured for MinIO (local) or AWS (production).
    pub async fn connect(
        bucket: &str,
        endpoint: &str,
        region: &str,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Self {
        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "resume-api-static",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .load()
            .await;

        // MinIO and most S3-compatible hosts need path-style addressing.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: bucket.to_string(),
        }
    }
}

#[async_trait]
impl FileStore for S3FileStore {
    async fn put(&self, key: &str, content_type: &str, bytes: Bytes) -> Result<(), AppError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, AppError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 download failed: {e}")))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("S3 download failed: {e}")))?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 delete failed: {e}")))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Local directory
// ---------------------------------------------------------------------------

pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Keys are generated by [`storage_key`]; anything that could escape the
    /// root is refused.
    fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(key);
        let escapes = relative.is_absolute()
            || relative
                .components()
                .any(|c| !matches!(c, std::path::Component::Normal(_)));
        if escapes || key.is_empty() {
            return Err(AppError::Storage(format!("invalid storage key '{key}'")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn put(&self, key: &str, _content_type: &str, bytes: Bytes) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("cannot create {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::Storage(format!("cannot write {}: {e}", path.display())))?;
        info!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, AppError> {
        let path = self.path_for(key)?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::Storage(format!("cannot read {}: {e}", path.display())))?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| AppError::Storage(format!("cannot delete {}: {e}", path.display())))
    }
}
