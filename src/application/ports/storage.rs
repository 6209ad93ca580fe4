//! Storage port interface

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Failed to create directory {path}: {message}")]
    CreateDirFailed { path: PathBuf, message: String },

    #[error("Failed to remove {path}: {message}")]
    RemoveFailed { path: PathBuf, message: String },

    #[error("Failed to list {path}: {message}")]
    ListFailed { path: PathBuf, message: String },
}

/// Port for the directory holding produced videos
#[async_trait]
pub trait Storage: Send + Sync {
    /// Writable output directory, created on demand
    async fn resolve_output_directory(&self) -> Result<PathBuf, StorageError>;

    /// Remove a file. Returns whether something was removed.
    async fn remove_if_exists(&self, path: &Path) -> Result<bool, StorageError>;

    /// Produced videos, filtered by known video extensions
    async fn list_video_files(&self) -> Result<Vec<PathBuf>, StorageError>;
}

#[async_trait]
impl<T: Storage + ?Sized> Storage for Arc<T> {
    async fn resolve_output_directory(&self) -> Result<PathBuf, StorageError> {
        self.as_ref().resolve_output_directory().await
    }

    async fn remove_if_exists(&self, path: &Path) -> Result<bool, StorageError> {
        self.as_ref().remove_if_exists(path).await
    }

    async fn list_video_files(&self) -> Result<Vec<PathBuf>, StorageError> {
        self.as_ref().list_video_files().await
    }
}
