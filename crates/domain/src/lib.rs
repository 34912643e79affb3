//! Domain entities, invariants and the access policy engine.

#![forbid(unsafe_code)]

mod file;
mod file_type;
mod policy;
mod project;
mod task;
mod user;

pub use file::{
    AttachmentTarget, FILE_DESCRIPTION_MAX_LENGTH, FileAttachment, NewFileAttachment, storage_path,
};
pub use file_type::{
    ALLOWED_MIME_TYPES, DEFAULT_MAX_UPLOAD_BYTES, FileCategory, OCTET_STREAM, detect_mime_type,
    file_extension, human_readable_size, mime_from_extension, validate_upload,
};
pub use policy::{
    AccessPolicy, Actor, Decision, FileScope, Operation, ProjectWritePolicy, Resource,
    ResourceKind, TaskScope, Visibility, VisibilityClause, authorize, visible_set,
};
pub use project::{PROJECT_NAME_MAX_LENGTH, Project, ProjectStatus};
pub use task::{TASK_TITLE_MAX_LENGTH, Task, TaskDetails, TaskField, TaskPriority, TaskStatus};
pub use user::{
    EmailAddress, PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH, USERNAME_MAX_LENGTH, UserAccount,
    UserProfile, Username, validate_password,
};
