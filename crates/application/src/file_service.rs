//! File attachment use-cases: validated upload, visibility-filtered
//! listing, counted download and storage statistics.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use taskhub_core::{AppError, AppResult, FileId, ProjectId, TaskId, UserId};
use taskhub_domain::{
    AccessPolicy, Actor, AttachmentTarget, FileAttachment, FileCategory, NewFileAttachment,
    Operation, Resource, ResourceKind, human_readable_size, validate_upload,
};
use tracing::{info, warn};

use crate::access::{
    LoadedFile, LoadedTask, not_found, require_authenticated, require_collection,
    require_decision, require_object,
};
use crate::{FileListQuery, FileRepository, FileStorage, ProjectRepository, TaskRepository};


/// Number of uploaders reported in storage statistics.
const TOP_UPLOADERS: usize = 5;

/// Input payload for an upload. At most one of `project_id` and `task_id`
/// may be set; with neither the file becomes a personal file of the
/// uploader.
#[derive(Debug, Clone)]
pub struct UploadFileInput {
    /// Client filename.
    pub filename: String,
    /// File content.
    pub content: Vec<u8>,
    /// Target project.
    pub project_id: Option<ProjectId>,
    /// Target task.
    pub task_id: Option<TaskId>,
    /// Free-form description.
    pub description: String,
    /// Whether any authenticated user may read the file.
    pub is_public: bool,
}

/// Editable file metadata.
#[derive(Debug, Clone)]
pub struct UpdateFileInput {
    /// Free-form description.
    pub description: String,
    /// Public flag.
    pub is_public: bool,
}

/// Content and metadata of a download.
#[derive(Debug, Clone)]
pub struct FileDownload {
    /// Metadata after the download was counted.
    pub file: FileAttachment,
    /// Blob content.
    pub content: Vec<u8>,
}

/// Usage of one file category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryUsage {
    /// Category.
    pub category: FileCategory,
    /// Number of files.
    pub files: usize,
    /// Total bytes.
    pub bytes: u64,
}

/// Usage of one uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploaderUsage {
    /// Uploader.
    pub user_id: UserId,
    /// Number of files.
    pub files: usize,
    /// Total bytes.
    pub bytes: u64,
}

/// Aggregate storage usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of stored files.
    pub total_files: usize,
    /// Total bytes stored.
    pub total_bytes: u64,
    /// `total_bytes` formatted for humans.
    pub total_size: String,
    /// Usage per category, every category listed.
    pub by_category: Vec<CategoryUsage>,
    /// Largest uploaders by bytes, descending.
    pub top_uploaders: Vec<UploaderUsage>,
}

/// Application service for file attachments.
#[derive(Clone)]
pub struct FileService {
    file_repository: Arc<dyn FileRepository>,
    project_repository: Arc<dyn ProjectRepository>,
    task_repository: Arc<dyn TaskRepository>,
    file_storage: Arc<dyn FileStorage>,
    policy: AccessPolicy,
    max_upload_bytes: u64,
}

impl FileService {
    /// Creates a new file service.
    #[must_use]
    pub fn new(
        file_repository: Arc<dyn FileRepository>,
        project_repository: Arc<dyn ProjectRepository>,
        task_repository: Arc<dyn TaskRepository>,
        file_storage: Arc<dyn FileStorage>,
        policy: AccessPolicy,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            file_repository,
            project_repository,
            task_repository,
            file_storage,
            policy,
            max_upload_bytes,
        }
    }

    /// Stores an upload. `uploaded_by` is always the actor.
    pub async fn upload_file(
        &self,
        actor: &Actor,
        input: UploadFileInput,
    ) -> AppResult<FileAttachment> {
        require_collection(&self.policy, actor, Operation::Create, ResourceKind::File)?;
        let uploader = actor
            .user_id()
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

        let mime_type = validate_upload(&input.content, &input.filename, self.max_upload_bytes)?;
        let target = self
            .resolve_target(actor, uploader, input.project_id, input.task_id)
            .await?;

        let file = FileAttachment::create(
            uploader,
            NewFileAttachment {
                original_filename: input.filename,
                mime_type: mime_type.to_owned(),
                size: input.content.len() as u64,
                target,
                description: input.description,
                is_public: input.is_public,
            },
        )?;

        self.file_storage
            .store(file.storage_path(), &input.content)
            .await?;
        if let Err(error) = self.file_repository.insert(file.clone()).await {
            if let Err(cleanup_error) = self.file_storage.remove(file.storage_path()).await {
                warn!(
                    path = file.storage_path(),
                    error = %cleanup_error,
                    "failed to remove orphaned blob"
                );
            }
            return Err(error);
        }

        info!(
            file_id = %file.id(),
            uploaded_by = %uploader,
            mime_type = file.mime_type(),
            size = file.size(),
            "file uploaded"
        );
        Ok(file)
    }

    /// Lists files visible to the actor that satisfy `query`.
    pub async fn list_files(
        &self,
        actor: &Actor,
        query: FileListQuery,
    ) -> AppResult<Vec<FileAttachment>> {
        require_collection(&self.policy, actor, Operation::List, ResourceKind::File)?;
        let visibility = self.policy.visible_set(actor, ResourceKind::File);
        self.file_repository.list(&visibility, &query).await
    }

    /// Returns one file's metadata.
    pub async fn get_file(&self, actor: &Actor, file_id: FileId) -> AppResult<FileAttachment> {
        let loaded = self
            .load_authorized(actor, Operation::Retrieve, file_id)
            .await?;
        Ok(loaded.file)
    }

    /// Returns file content and counts the download.
    pub async fn download_file(&self, actor: &Actor, file_id: FileId) -> AppResult<FileDownload> {
        let loaded = self
            .load_authorized(actor, Operation::Download, file_id)
            .await?;
        let content = self.file_storage.load(loaded.file.storage_path()).await?;
        let file = self
            .file_repository
            .record_download(file_id, Utc::now())
            .await?;

        Ok(FileDownload { file, content })
    }

    /// Updates description and public flag.
    pub async fn update_file(
        &self,
        actor: &Actor,
        file_id: FileId,
        input: UpdateFileInput,
    ) -> AppResult<FileAttachment> {
        self.load_authorized(actor, Operation::Update, file_id).await?;

        self.file_repository
            .update_metadata(file_id, input.description, input.is_public)
            .await
    }

    /// Deletes metadata and blob.
    pub async fn delete_file(&self, actor: &Actor, file_id: FileId) -> AppResult<()> {
        self.load_authorized(actor, Operation::Delete, file_id).await?;

        if let Some(file) = self.file_repository.delete(file_id).await?
            && let Err(error) = self.file_storage.remove(file.storage_path()).await
        {
            warn!(file_id = %file_id, error = %error, "failed to remove blob of deleted file");
        }
        info!(file_id = %file_id, deleted_by = ?actor.user_id(), "file deleted");

        Ok(())
    }

    /// Returns storage usage across all files. Administrators only.
    pub async fn storage_stats(&self, actor: &Actor) -> AppResult<StorageStats> {
        require_authenticated(actor)?;
        require_decision(
            actor.is_admin().into(),
            actor,
            Operation::List,
            ResourceKind::File,
        )?;

        let visibility = self.policy.visible_set(actor, ResourceKind::File);
        let files = self
            .file_repository
            .list(&visibility, &FileListQuery::default())
            .await?;

        Ok(summarize(&files))
    }

    async fn resolve_target(
        &self,
        actor: &Actor,
        uploader: UserId,
        project_id: Option<ProjectId>,
        task_id: Option<TaskId>,
    ) -> AppResult<AttachmentTarget> {
        match (project_id, task_id) {
            (Some(_), Some(_)) => Err(AppError::Validation(
                "a file can be attached to a project or a task, not both".to_owned(),
            )),
            (Some(project_id), None) => {
                let project = self
                    .project_repository
                    .find_by_id(project_id)
                    .await?
                    .ok_or_else(|| not_found(ResourceKind::Project, project_id))?;
                if !self
                    .policy
                    .visible_set(actor, ResourceKind::Project)
                    .admits_project(&project)
                {
                    return Err(not_found(ResourceKind::Project, project_id));
                }
                Ok(AttachmentTarget::Project(project_id))
            }
            (None, Some(task_id)) => {
                let loaded = self.load_task(task_id).await?;
                if !self
                    .policy
                    .visible_set(actor, ResourceKind::Task)
                    .admits_task(loaded.scope())
                {
                    return Err(not_found(ResourceKind::Task, task_id));
                }
                Ok(AttachmentTarget::Task(task_id))
            }
            (None, None) => Ok(AttachmentTarget::User(uploader)),
        }
    }

    async fn load_authorized(
        &self,
        actor: &Actor,
        operation: Operation,
        file_id: FileId,
    ) -> AppResult<LoadedFile> {
        require_authenticated(actor)?;
        let file = self
            .file_repository
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| not_found(ResourceKind::File, file_id))?;

        let project = match file.project() {
            Some(project_id) => self.project_repository.find_by_id(project_id).await?,
            None => None,
        };
        let task = match file.task() {
            Some(task_id) => Some(self.load_task(task_id).await?),
            None => None,
        };

        let loaded = LoadedFile {
            file,
            project,
            task,
        };
        require_object(
            &self.policy,
            actor,
            operation,
            Resource::File(loaded.scope()),
            file_id,
        )?;
        Ok(loaded)
    }

    async fn load_task(&self, task_id: TaskId) -> AppResult<LoadedTask> {
        let task = self
            .task_repository
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| not_found(ResourceKind::Task, task_id))?;
        let project = self
            .project_repository
            .find_by_id(task.project_id())
            .await?
            .ok_or_else(|| not_found(ResourceKind::Task, task_id))?;
        Ok(LoadedTask { task, project })
    }
}

fn summarize(files: &[FileAttachment]) -> StorageStats {
    let total_bytes = files.iter().map(FileAttachment::size).sum();

    let by_category = FileCategory::all()
        .iter()
        .map(|category| {
            let (count, bytes) = files
                .iter()
                .filter(|file| file.category() == *category)
                .fold((0, 0), |(count, bytes), file| (count + 1, bytes + file.size()));
            CategoryUsage {
                category: *category,
                files: count,
                bytes,
            }
        })
        .collect();

    let mut per_uploader: HashMap<UserId, UploaderUsage> = HashMap::new();
    for file in files {
        let usage = per_uploader
            .entry(file.uploaded_by())
            .or_insert_with(|| UploaderUsage {
                user_id: file.uploaded_by(),
                files: 0,
                bytes: 0,
            });
        usage.files += 1;
        usage.bytes += file.size();
    }
    let mut top_uploaders: Vec<UploaderUsage> = per_uploader.into_values().collect();
    top_uploaders.sort_by(|left, right| {
        right
            .bytes
            .cmp(&left.bytes)
            .then_with(|| left.user_id.cmp(&right.user_id))
    });
    top_uploaders.truncate(TOP_UPLOADERS);

    StorageStats {
        total_files: files.len(),
        total_bytes,
        total_size: human_readable_size(total_bytes),
        by_category,
        top_uploaders,
    }
}
