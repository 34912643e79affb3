use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhub_application::{
    CategoryUsage, FileListQuery, StorageStats, UpdateFileInput, UploaderUsage,
};
use taskhub_core::{FileId, ProjectId, TaskId, UserId};
use taskhub_domain::{FileAttachment, FileCategory, human_readable_size};

/// Query-string filters for file listing.
#[derive(Debug, Default, Deserialize)]
pub struct FileListParams {
    pub project: Option<ProjectId>,
    pub task: Option<TaskId>,
    pub user: Option<UserId>,
    pub category: Option<FileCategory>,
}

impl From<FileListParams> for FileListQuery {
    fn from(params: FileListParams) -> Self {
        Self {
            project: params.project,
            task: params.task,
            user: params.user,
            category: params.category,
        }
    }
}

/// Incoming payload for file metadata updates.
#[derive(Debug, Deserialize)]
pub struct UpdateFileRequest {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_public: bool,
}

impl From<UpdateFileRequest> for UpdateFileInput {
    fn from(request: UpdateFileRequest) -> Self {
        Self {
            description: request.description,
            is_public: request.is_public,
        }
    }
}

/// API representation of stored file metadata.
#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: FileId,
    pub original_filename: String,
    pub extension: String,
    pub mime_type: String,
    pub category: FileCategory,
    pub size: u64,
    pub human_size: String,
    pub uploaded_by: UserId,
    pub user: Option<UserId>,
    pub project: Option<ProjectId>,
    pub task: Option<TaskId>,
    pub description: String,
    pub is_public: bool,
    pub uploaded_at: DateTime<Utc>,
    pub last_accessed: Option<DateTime<Utc>>,
    pub download_count: u64,
}

impl From<FileAttachment> for FileResponse {
    fn from(file: FileAttachment) -> Self {
        Self {
            id: file.id(),
            original_filename: file.original_filename().to_owned(),
            extension: file.extension(),
            mime_type: file.mime_type().to_owned(),
            category: file.category(),
            size: file.size(),
            human_size: human_readable_size(file.size()),
            uploaded_by: file.uploaded_by(),
            user: file.user(),
            project: file.project(),
            task: file.task(),
            description: file.description().to_owned(),
            is_public: file.is_public(),
            uploaded_at: file.uploaded_at(),
            last_accessed: file.last_accessed(),
            download_count: file.download_count(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryUsageResponse {
    pub category: FileCategory,
    pub files: usize,
    pub bytes: u64,
}

impl From<CategoryUsage> for CategoryUsageResponse {
    fn from(usage: CategoryUsage) -> Self {
        Self {
            category: usage.category,
            files: usage.files,
            bytes: usage.bytes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploaderUsageResponse {
    pub user_id: UserId,
    pub files: usize,
    pub bytes: u64,
    pub human_size: String,
}

impl From<UploaderUsage> for UploaderUsageResponse {
    fn from(usage: UploaderUsage) -> Self {
        Self {
            user_id: usage.user_id,
            files: usage.files,
            bytes: usage.bytes,
            human_size: human_readable_size(usage.bytes),
        }
    }
}

/// Administrator storage report.
#[derive(Debug, Serialize)]
pub struct StorageStatsResponse {
    pub total_files: usize,
    pub total_bytes: u64,
    pub total_size: String,
    pub by_category: Vec<CategoryUsageResponse>,
    pub top_uploaders: Vec<UploaderUsageResponse>,
}

impl From<StorageStats> for StorageStatsResponse {
    fn from(stats: StorageStats) -> Self {
        Self {
            total_files: stats.total_files,
            total_bytes: stats.total_bytes,
            total_size: stats.total_size,
            by_category: stats
                .by_category
                .into_iter()
                .map(CategoryUsageResponse::from)
                .collect(),
            top_uploaders: stats
                .top_uploaders
                .into_iter()
                .map(UploaderUsageResponse::from)
                .collect(),
        }
    }
}
