use async_trait::async_trait;
use chrono::{DateTime, Utc};
use taskhub_application::{FileListQuery, FileRepository};
use taskhub_core::{AppError, AppResult, FileId};
use taskhub_domain::{FileAttachment, Visibility};

use super::InMemoryStore;

#[async_trait]
impl FileRepository for InMemoryStore {
    async fn find_by_id(&self, file_id: FileId) -> AppResult<Option<FileAttachment>> {
        Ok(self.state.read().await.files.get(&file_id).cloned())
    }

    async fn list(
        &self,
        visibility: &Visibility,
        query: &FileListQuery,
    ) -> AppResult<Vec<FileAttachment>> {
        let state = self.state.read().await;
        let mut files: Vec<FileAttachment> = state
            .files
            .values()
            .filter(|file| query.matches(file) && state.file_visible(visibility, file))
            .cloned()
            .collect();
        files.sort_by(|left, right| right.uploaded_at().cmp(&left.uploaded_at()));

        Ok(files)
    }

    async fn insert(&self, file: FileAttachment) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.files.contains_key(&file.id()) {
            return Err(AppError::Conflict(format!(
                "file '{}' already exists",
                file.id()
            )));
        }

        state.files.insert(file.id(), file);
        Ok(())
    }

    async fn update_metadata(
        &self,
        file_id: FileId,
        description: String,
        is_public: bool,
    ) -> AppResult<FileAttachment> {
        let mut state = self.state.write().await;
        let file = state
            .files
            .get_mut(&file_id)
            .ok_or_else(|| AppError::NotFound(format!("file '{file_id}' does not exist")))?;

        file.update_metadata(description, is_public)?;
        Ok(file.clone())
    }

    async fn record_download(
        &self,
        file_id: FileId,
        at: DateTime<Utc>,
    ) -> AppResult<FileAttachment> {
        let mut state = self.state.write().await;
        let file = state
            .files
            .get_mut(&file_id)
            .ok_or_else(|| AppError::NotFound(format!("file '{file_id}' does not exist")))?;

        file.record_download(at);
        Ok(file.clone())
    }

    async fn delete(&self, file_id: FileId) -> AppResult<Option<FileAttachment>> {
        Ok(self.state.write().await.files.remove(&file_id))
    }
}
