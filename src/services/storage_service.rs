// src/services/storage_service.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{config::BackendConfig, errors::SurplusError as AppError};

pub const DEMO_IMAGE_URL: &str = "https://images.unsplash.com/photo-1547592166-23ac45744acd?w=400";

#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Stores the object and returns its public URL.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, AppError>;
}

/// `{user_id}/{unix_millis}.{ext}`
pub fn object_path(user_id: &str, extension: &str, now: DateTime<Utc>) -> String {
    format!("{}/{}.{}", user_id, now.timestamp_millis(), extension)
}

/// Bucket uploads signed with the backend key, which must be allowed to write the bucket.
pub struct ManagedStorage {
    client: reqwest::Client,
    config: BackendConfig,
    bucket: String,
}

impl ManagedStorage {
    pub fn new(client: reqwest::Client, config: BackendConfig, bucket: impl Into<String>) -> Self {
        Self {
            client,
            config,
            bucket: bucket.into(),
        }
    }

    fn base(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base(), self.bucket, path)
    }
}

#[async_trait]
impl ImageStorage for ManagedStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, AppError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base(), self.bucket, path);
        tracing::info!("Uploading {} bytes to {}/{}", bytes.len(), self.bucket, path);

        let response = self
            .client
            .post(url)
            .header("apikey", &self.config.key)
            .bearer_auth(&self.config.key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::ImageUpload(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Upload Error: {}", error_text);
            return Err(AppError::ImageUpload(error_text));
        }

        Ok(self.public_url(path))
    }
}

// Mock storage for offline demos
#[derive(Debug, Default)]
pub struct MockStorage;

#[async_trait]
impl ImageStorage for MockStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String, AppError> {
        tracing::info!("[MOCK] Would upload {} bytes to {}", bytes.len(), path);
        Ok(DEMO_IMAGE_URL.to_string())
    }
}
