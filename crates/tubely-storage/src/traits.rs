//! Storage abstraction trait
//!
//! Every storage backend implements `Storage`. The ingestion pipeline only
//! ever writes; nothing is read back or deleted through this trait.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload `data` under `storage_key` and return the public URL.
    async fn upload_bytes(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Upload the local file at `path` under `storage_key` and return the
    /// public URL. The source file is left untouched.
    async fn upload_file(
        &self,
        storage_key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<String> {
        let data = tokio::fs::read(path).await?;
        self.upload_bytes(storage_key, Bytes::from(data), content_type)
            .await
    }

    /// Public locator for a key, whether or not it has been written yet.
    fn public_url(&self, storage_key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
