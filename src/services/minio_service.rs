use crate::config::minio::MinIOSettings;
use aws_sdk_s3::{primitives::ByteStream, Client as S3Client};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub type StorageResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Object storage for team logos
#[derive(Clone, Debug)]
pub struct MinIOService {
    client: Arc<S3Client>,
    bucket_name: String,
}

impl MinIOService {
    pub async fn new(settings: MinIOSettings) -> StorageResult<Self> {
        let service = Self {
            client: Arc::new(settings.s3_client()),
            bucket_name: settings.bucket_name.clone(),
        };
        service.init_bucket().await?;
        Ok(service)
    }

    async fn init_bucket(&self) -> StorageResult<()> {
        info!("Initializing storage bucket: {}", self.bucket_name);

        let exists = self
            .client
            .head_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
            .is_ok();

        if !exists {
            info!("Creating storage bucket: {}", self.bucket_name);
            self.client
                .create_bucket()
                .bucket(&self.bucket_name)
                .send()
                .await?;
        }
        Ok(())
    }

    /// Store a team logo and return its object key
    pub async fn upload_logo(
        &self,
        team_id: Uuid,
        file_data: Bytes,
        extension: &str,
        content_type: &str,
    ) -> StorageResult<String> {
        let object_key = format!("logos/{}/{}.{}", team_id, Uuid::new_v4(), extension);
        self.upload_file(&object_key, file_data, content_type, team_id).await?;
        Ok(object_key)
    }

    pub async fn upload_file(
        &self,
        object_key: &str,
        file_data: Bytes,
        content_type: &str,
        team_id: Uuid,
    ) -> StorageResult<()> {
        info!("Uploading {} ({} bytes)", object_key, file_data.len());

        match self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(object_key)
            .body(ByteStream::from(file_data))
            .content_type(content_type)
            .metadata("team_id", team_id.to_string())
            .metadata("uploaded_at", chrono::Utc::now().to_rfc3339())
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Failed to upload {}: {}", object_key, e);
                Err(Box::new(e))
            }
        }
    }

    /// Object bytes and content type
    pub async fn get_file(&self, object_key: &str) -> StorageResult<(Bytes, String)> {
        match self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(object_key)
            .send()
            .await
        {
            Ok(response) => {
                let content_type = response
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = response.body.collect().await?.into_bytes();
                Ok((bytes, content_type))
            }
            Err(e) => {
                warn!("Object {} not available: {}", object_key, e);
                Err(Box::new(e))
            }
        }
    }

    pub async fn delete_file(&self, object_key: &str) -> StorageResult<()> {
        info!("Deleting {}", object_key);

        match self
            .client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(object_key)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Failed to delete {}: {}", object_key, e);
                Err(Box::new(e))
            }
        }
    }
}

/// Public path the media route serves an object key under
pub fn media_url(object_key: &str) -> String {
    format!("/media/{}", object_key)
}

/// Object key behind a public media path, if it is one
pub fn object_key_from_url(url: &str) -> Option<&str> {
    url.strip_prefix("/media/").filter(|key| !key.is_empty())
}
