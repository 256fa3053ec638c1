//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use avaluos_core::AppError;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid object name: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConfigError(msg) => AppError::Config(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Options for [`Storage::put_object`]
#[derive(Debug, Clone)]
pub struct PutObjectOptions {
    pub content_type: String,
    /// Cache directive stored with the object (e.g. `max-age=3600`)
    pub cache_control: Option<String>,
    /// Replace an existing object with the same name instead of failing
    pub overwrite: bool,
}

impl PutObjectOptions {
    pub fn overwrite(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            cache_control: None,
            overwrite: true,
        }
    }

    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = Some(cache_control.into());
        self
    }
}

/// Storage abstraction trait
///
/// Backends store opaque byte blobs under a single-segment object name and
/// issue time-limited read URLs for them.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write an object. With `overwrite` unset an existing object is an error.
    async fn put_object(
        &self,
        name: &str,
        data: Vec<u8>,
        options: &PutObjectOptions,
    ) -> StorageResult<()>;

    /// Read an object
    async fn get_object(&self, name: &str) -> StorageResult<Vec<u8>>;

    /// Issue a signed GET URL valid for `expires_in`.
    ///
    /// Fails with `NotFound` when the object does not exist.
    async fn signed_url(&self, name: &str, expires_in: Duration) -> StorageResult<String>;

    /// Check if an object exists
    async fn exists(&self, name: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
