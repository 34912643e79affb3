use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhub_core::{AppError, AppResult, FileId, NonEmptyString, ProjectId, TaskId, UserId};

use crate::file_type::{FileCategory, file_extension};

/// Maximum length of a file description.
pub const FILE_DESCRIPTION_MAX_LENGTH: usize = 500;

/// What a file is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AttachmentTarget {
    /// Personal file of a user.
    User(UserId),
    /// Project-level attachment.
    Project(ProjectId),
    /// Task-level attachment.
    Task(TaskId),
    /// Not attached to anything.
    Unattached,
}

impl AttachmentTarget {
    /// Returns the storage folder for this target.
    #[must_use]
    pub fn storage_folder(&self) -> String {
        match self {
            Self::User(user_id) => format!("users/{user_id}"),
            Self::Project(project_id) => format!("projects/{project_id}"),
            Self::Task(task_id) => format!("tasks/{task_id}"),
            Self::Unattached => "general".to_owned(),
        }
    }
}

/// Data captured when an upload is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileAttachment {
    /// Client filename.
    pub original_filename: String,
    /// Detected MIME type.
    pub mime_type: String,
    /// Content length in bytes.
    pub size: u64,
    /// Attachment target.
    pub target: AttachmentTarget,
    /// Free-form description.
    pub description: String,
    /// Whether any authenticated user may read the file.
    pub is_public: bool,
}

/// Metadata of a stored upload.
///
/// Relations follow the "at most one target" convention: a file carries a
/// user, project or task reference, never more than one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    id: FileId,
    original_filename: NonEmptyString,
    mime_type: String,
    category: FileCategory,
    size: u64,
    storage_path: String,
    uploaded_by: UserId,
    user: Option<UserId>,
    project: Option<ProjectId>,
    task: Option<TaskId>,
    description: String,
    is_public: bool,
    uploaded_at: DateTime<Utc>,
    last_accessed: Option<DateTime<Utc>>,
    download_count: u64,
}

impl FileAttachment {
    /// Records an accepted upload by `uploaded_by`.
    pub fn create(uploaded_by: UserId, upload: NewFileAttachment) -> AppResult<Self> {
        let original_filename = sanitize_filename(&upload.original_filename)?;
        validate_description(&upload.description)?;

        let id = FileId::new();
        let uploaded_at = Utc::now();
        let storage_path =
            storage_path(&upload.target, id, original_filename.as_str(), uploaded_at);
        let (user, project, task) = match upload.target {
            AttachmentTarget::User(user_id) => (Some(user_id), None, None),
            AttachmentTarget::Project(project_id) => (None, Some(project_id), None),
            AttachmentTarget::Task(task_id) => (None, None, Some(task_id)),
            AttachmentTarget::Unattached => (None, None, None),
        };

        Ok(Self {
            id,
            original_filename,
            category: FileCategory::from_mime(&upload.mime_type),
            mime_type: upload.mime_type,
            size: upload.size,
            storage_path,
            uploaded_by,
            user,
            project,
            task,
            description: upload.description,
            is_public: upload.is_public,
            uploaded_at,
            last_accessed: None,
            download_count: 0,
        })
    }

    /// Returns the file identifier.
    #[must_use]
    pub fn id(&self) -> FileId {
        self.id
    }

    /// Returns the sanitized client filename.
    #[must_use]
    pub fn original_filename(&self) -> &str {
        self.original_filename.as_str()
    }

    /// Returns the MIME type.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        self.mime_type.as_str()
    }

    /// Returns the category.
    #[must_use]
    pub fn category(&self) -> FileCategory {
        self.category
    }

    /// Returns the size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the relative blob path.
    #[must_use]
    pub fn storage_path(&self) -> &str {
        self.storage_path.as_str()
    }

    /// Returns the uploader.
    #[must_use]
    pub fn uploaded_by(&self) -> UserId {
        self.uploaded_by
    }

    /// Returns the owning user for personal files.
    #[must_use]
    pub fn user(&self) -> Option<UserId> {
        self.user
    }

    /// Returns the attached project.
    #[must_use]
    pub fn project(&self) -> Option<ProjectId> {
        self.project
    }

    /// Returns the attached task.
    #[must_use]
    pub fn task(&self) -> Option<TaskId> {
        self.task
    }

    /// Returns the attachment target, preferring user, then project, then task.
    #[must_use]
    pub fn target(&self) -> AttachmentTarget {
        if let Some(user_id) = self.user {
            AttachmentTarget::User(user_id)
        } else if let Some(project_id) = self.project {
            AttachmentTarget::Project(project_id)
        } else if let Some(task_id) = self.task {
            AttachmentTarget::Task(task_id)
        } else {
            AttachmentTarget::Unattached
        }
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns whether the file is public.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.is_public
    }

    /// Returns the upload timestamp.
    #[must_use]
    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    /// Returns the last download timestamp.
    #[must_use]
    pub fn last_accessed(&self) -> Option<DateTime<Utc>> {
        self.last_accessed
    }

    /// Returns the download counter.
    #[must_use]
    pub fn download_count(&self) -> u64 {
        self.download_count
    }

    /// Returns the lower-cased extension including the dot, or empty.
    #[must_use]
    pub fn extension(&self) -> String {
        file_extension(self.original_filename.as_str())
            .map(|extension| format!(".{extension}"))
            .unwrap_or_default()
    }

    /// Updates editable metadata.
    pub fn update_metadata(&mut self, description: String, is_public: bool) -> AppResult<()> {
        validate_description(&description)?;
        self.description = description;
        self.is_public = is_public;
        Ok(())
    }

    /// Counts one download.
    pub fn record_download(&mut self, at: DateTime<Utc>) {
        self.download_count = self.download_count.saturating_add(1);
        self.last_accessed = Some(at);
    }
}

/// Builds `uploads/<folder>/<timestamp>_<file id>_<filename>` for a new blob.
/// Paths are unique per file id, even for equal names and timestamps.
#[must_use]
pub fn storage_path(
    target: &AttachmentTarget,
    file_id: FileId,
    filename: &str,
    at: DateTime<Utc>,
) -> String {
    format!(
        "uploads/{}/{}_{file_id}_{filename}",
        target.storage_folder(),
        at.format("%Y%m%d_%H%M%S")
    )
}

fn sanitize_filename(filename: &str) -> AppResult<NonEmptyString> {
    let base_name = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base_name
        .chars()
        .filter(|character| !character.is_control())
        .collect();

    if cleaned == "." || cleaned == ".." {
        return Err(AppError::Validation(format!(
            "invalid filename '{filename}'"
        )));
    }

    NonEmptyString::new(cleaned.trim())
        .map_err(|_| AppError::Validation("filename must not be empty".to_owned()))
}

fn validate_description(description: &str) -> AppResult<()> {
    if description.chars().count() > FILE_DESCRIPTION_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "description must not exceed {FILE_DESCRIPTION_MAX_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(target: AttachmentTarget, filename: &str) -> NewFileAttachment {
        NewFileAttachment {
            original_filename: filename.to_owned(),
            mime_type: "application/pdf".to_owned(),
            size: 2048,
            target,
            description: String::new(),
            is_public: false,
        }
    }

    #[test]
    fn target_sets_exactly_one_relation() -> AppResult<()> {
        let project_id = ProjectId::new();
        let file = FileAttachment::create(
            UserId::new(),
            upload(AttachmentTarget::Project(project_id), "brief.pdf"),
        )?;

        assert_eq!(file.project(), Some(project_id));
        assert_eq!(file.user(), None);
        assert_eq!(file.task(), None);
        assert_eq!(file.target(), AttachmentTarget::Project(project_id));
        assert!(
            file.storage_path()
                .starts_with(&format!("uploads/projects/{project_id}/"))
        );
        assert!(file.storage_path().ends_with("_brief.pdf"));
        Ok(())
    }

    #[test]
    fn same_name_uploads_in_one_second_get_distinct_paths() -> AppResult<()> {
        let target = AttachmentTarget::Project(ProjectId::new());
        let at = Utc::now();

        let first = storage_path(&target, FileId::new(), "report.pdf", at);
        let second = storage_path(&target, FileId::new(), "report.pdf", at);
        assert_ne!(first, second);

        let uploader = UserId::new();
        let left = FileAttachment::create(uploader, upload(target, "report.pdf"))?;
        let right = FileAttachment::create(uploader, upload(target, "report.pdf"))?;
        assert_ne!(left.storage_path(), right.storage_path());
        assert!(
            left.storage_path()
                .ends_with(&format!("_{}_report.pdf", left.id()))
        );
        Ok(())
    }

    #[test]
    fn directory_components_are_stripped_from_filenames() -> AppResult<()> {
        let file = FileAttachment::create(
            UserId::new(),
            upload(AttachmentTarget::Unattached, "../../etc/passwd.pdf"),
        )?;
        assert_eq!(file.original_filename(), "passwd.pdf");
        assert!(file.storage_path().starts_with("uploads/general/"));
        Ok(())
    }

    #[test]
    fn empty_or_dot_filenames_are_rejected() {
        let uploader = UserId::new();
        assert!(
            FileAttachment::create(uploader, upload(AttachmentTarget::Unattached, "dir/")).is_err()
        );
        assert!(
            FileAttachment::create(uploader, upload(AttachmentTarget::Unattached, "..")).is_err()
        );
    }

    #[test]
    fn downloads_are_counted() -> AppResult<()> {
        let mut file =
            FileAttachment::create(UserId::new(), upload(AttachmentTarget::Unattached, "a.pdf"))?;
        let now = Utc::now();
        file.record_download(now);
        file.record_download(now);
        assert_eq!(file.download_count(), 2);
        assert_eq!(file.last_accessed(), Some(now));
        assert_eq!(file.category(), FileCategory::Document);
        assert_eq!(file.extension(), ".pdf");
        Ok(())
    }

    #[test]
    fn long_descriptions_are_rejected() -> AppResult<()> {
        let mut file =
            FileAttachment::create(UserId::new(), upload(AttachmentTarget::Unattached, "a.pdf"))?;
        let result = file.update_metadata("x".repeat(FILE_DESCRIPTION_MAX_LENGTH + 1), true);
        assert!(result.is_err());
        assert!(!file.is_public());
        Ok(())
    }
}
