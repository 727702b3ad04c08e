//! Object storage for exam question images.

use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client, Config,
};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::S3Config;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("S3 error: {0}")]
    S3(String),
    #[error("File not found: {0}")]
    NotFound(String),
}

/// A stored object and its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content: Vec<u8>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `content` under `key`, replacing any existing object.
    async fn put(&self, key: &str, content: Vec<u8>, content_type: Option<&str>)
        -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<StoredObject, StorageError>;

    /// Delete `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Keys starting with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Key of a question image: `exams/<exam>/<number>.<ext>`.
pub fn exam_image_key(exam_name: &str, question_no: u32, extension: &str) -> String {
    format!(
        "{}{}.{}",
        exam_prefix(exam_name),
        question_no,
        extension.trim_start_matches('.').to_ascii_lowercase()
    )
}

/// Prefix under which all images of an exam live.
pub fn exam_prefix(exam_name: &str) -> String {
    format!("exams/{}/", exam_name.trim_matches('/'))
}

/// MIME type guessed from a key's extension.
pub fn content_type_for(key: &str) -> &'static str {
    match key.rsplit('.').next().map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// S3/R2 object store.
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,  // session token
            None,  // expiry
            "env", // provider name
        );

        let mut config_builder = Config::builder()
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .behavior_version(aws_config::BehaviorVersion::latest());

        // Set custom endpoint for R2 or other S3-compatible services
        if let Some(endpoint_url) = &config.endpoint {
            config_builder = config_builder
                .endpoint_url(endpoint_url)
                .force_path_style(true);
        }

        let client = Client::from_conf(config_builder.build());

        Self {
            client,
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Storage {
    async fn put(
        &self,
        key: &str,
        content: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(content));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        tracing::info!("Uploaded object to S3: {}", key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let err = e.into_service_error();
                if err.is_no_such_key() {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::S3(err.to_string())
                }
            })?;

        let content_type = response.content_type().map(String::from);
        let content = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(StoredObject {
            content,
            content_type,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        tracing::info!("Deleted object from S3: {}", key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .send()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        Ok(response
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(String::from))
            .collect())
    }
}

/// In-process object store for local runs and tests.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        content: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                content,
                content_type: content_type.map(String::from),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .objects
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
