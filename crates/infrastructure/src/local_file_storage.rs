//! Filesystem blob storage rooted at a single directory.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use taskhub_application::FileStorage;
use taskhub_core::{AppError, AppResult};
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Stores uploaded blobs below a root directory.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Creates storage rooted at `root`. The directory is created lazily.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the storage root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> AppResult<PathBuf> {
        let relative = Path::new(path);
        let is_plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

        if path.is_empty() || !is_plain {
            return Err(AppError::Validation(format!(
                "invalid storage path '{path}'"
            )));
        }

        Ok(self.root.join(relative))
    }
}

/// Writes `content` to a freshly created blob, removing the blob again when
/// the write does not complete.
async fn write_blob<W>(mut writer: W, target: &Path, path: &str, content: &[u8]) -> AppResult<()>
where
    W: AsyncWrite + Unpin,
{
    let written = match writer.write_all(content).await {
        Ok(()) => writer
            .flush()
            .await
            .map_err(|error| format!("failed to flush '{path}': {error}")),
        Err(error) => Err(format!("failed to write '{path}': {error}")),
    };
    drop(writer);

    if let Err(message) = written {
        if let Err(cleanup_error) = fs::remove_file(target).await {
            warn!(path, error = %cleanup_error, "failed to remove partial blob");
        }
        return Err(AppError::Internal(message));
    }

    Ok(())
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, path: &str, content: &[u8]) -> AppResult<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|error| {
                AppError::Internal(format!(
                    "failed to create directory '{}': {error}",
                    parent.display()
                ))
            })?;
        }

        // Existing blobs are never overwritten.
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|error| match error.kind() {
                ErrorKind::AlreadyExists => {
                    AppError::Conflict(format!("a file is already stored at '{path}'"))
                }
                _ => AppError::Internal(format!("failed to open '{path}': {error}")),
            })?;

        write_blob(file, &target, path, content).await?;

        debug!(path, bytes = content.len(), "stored blob");
        Ok(())
    }

    async fn load(&self, path: &str) -> AppResult<Vec<u8>> {
        let target = self.resolve(path)?;
        fs::read(&target).await.map_err(|error| match error.kind() {
            ErrorKind::NotFound => AppError::NotFound(format!("no file is stored at '{path}'")),
            _ => AppError::Internal(format!("failed to read '{path}': {error}")),
        })
    }

    async fn remove(&self, path: &str) -> AppResult<()> {
        let target = self.resolve(path)?;
        match fs::remove_file(&target).await {
            Ok(()) => {
                debug!(path, "removed blob");
                Ok(())
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AppError::Internal(format!(
                "failed to remove '{path}': {error}"
            ))),
        }
    }
}
