use async_trait::async_trait;
use chrono::{DateTime, Utc};

use taskhub_core::{AppResult, FileId, ProjectId, TaskId, UserId};
use taskhub_domain::{FileAttachment, FileCategory, Visibility};

/// Optional filters for file listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileListQuery {
    /// Only files attached to this project.
    pub project: Option<ProjectId>,
    /// Only files attached to this task.
    pub task: Option<TaskId>,
    /// Only personal files of this user.
    pub user: Option<UserId>,
    /// Only files of this category.
    pub category: Option<FileCategory>,
}

impl FileListQuery {
    /// Returns whether `file` satisfies every set filter.
    #[must_use]
    pub fn matches(&self, file: &FileAttachment) -> bool {
        self.project
            .is_none_or(|project_id| file.project() == Some(project_id))
            && self.task.is_none_or(|task_id| file.task() == Some(task_id))
            && self.user.is_none_or(|user_id| file.user() == Some(user_id))
            && self
                .category
                .is_none_or(|category| file.category() == category)
    }
}

/// Repository port for file metadata.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Finds a file by identifier.
    async fn find_by_id(&self, file_id: FileId) -> AppResult<Option<FileAttachment>>;

    /// Lists files admitted by `visibility` and `query`, newest first.
    async fn list(
        &self,
        visibility: &Visibility,
        query: &FileListQuery,
    ) -> AppResult<Vec<FileAttachment>>;

    /// Inserts new file metadata.
    async fn insert(&self, file: FileAttachment) -> AppResult<()>;

    /// Replaces description and public flag of the stored record and
    /// returns it. Download statistics are left untouched.
    async fn update_metadata(
        &self,
        file_id: FileId,
        description: String,
        is_public: bool,
    ) -> AppResult<FileAttachment>;

    /// Atomically counts one download and returns the updated record.
    async fn record_download(&self, file_id: FileId, at: DateTime<Utc>)
    -> AppResult<FileAttachment>;

    /// Deletes file metadata and returns the removed record.
    async fn delete(&self, file_id: FileId) -> AppResult<Option<FileAttachment>>;
}

/// Port for blob content addressed by relative storage path.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Writes content at `path`, creating parent folders.
    async fn store(&self, path: &str, content: &[u8]) -> AppResult<()>;

    /// Reads content at `path`.
    async fn load(&self, path: &str) -> AppResult<Vec<u8>>;

    /// Removes content at `path`. Missing blobs are not an error.
    async fn remove(&self, path: &str) -> AppResult<()>;
}
