//! Local filesystem storage adapter

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::application::ports::{Storage, StorageError};
use crate::domain::config::VIDEO_CONTAINERS;

/// Output directory on the local filesystem
pub struct LocalVideoStorage {
    root: PathBuf,
}

impl LocalVideoStorage {
    /// Storage under the user's videos directory (`~/Videos/duo-stitch`),
    /// or the data directory on systems without one
    pub fn new() -> Self {
        let base = dirs::video_dir()
            .or_else(dirs::data_dir)
            .unwrap_or_else(std::env::temp_dir);
        Self {
            root: base.join("duo-stitch"),
        }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for LocalVideoStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn is_video_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));
    let known = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| VIDEO_CONTAINERS.iter().any(|c| c.eq_ignore_ascii_case(e)));
    !hidden && known
}

#[async_trait]
impl Storage for LocalVideoStorage {
    async fn resolve_output_directory(&self) -> Result<PathBuf, StorageError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::CreateDirFailed {
                path: self.root.clone(),
                message: e.to_string(),
            })?;
        Ok(self.root.clone())
    }

    async fn remove_if_exists(&self, path: &Path) -> Result<bool, StorageError> {
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed file");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::RemoveFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    async fn list_video_files(&self) -> Result<Vec<PathBuf>, StorageError> {
        let list_error = |e: std::io::Error| StorageError::ListFailed {
            path: self.root.clone(),
            message: e.to_string(),
        };

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(list_error(e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(list_error)? {
            let path = entry.path();
            let is_file = entry.file_type().await.map_err(list_error)?.is_file();
            if is_file && is_video_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}
