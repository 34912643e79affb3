//! Application services and ports.

#![forbid(unsafe_code)]

mod access;
mod file_ports;
mod file_service;
mod notification_ports;
mod project_ports;
mod project_service;
mod report_service;
mod task_service;
mod user_ports;
mod user_service;

#[cfg(test)]
mod test_support;

pub use file_ports::{FileListQuery, FileRepository, FileStorage};
pub use file_service::{
    CategoryUsage, FileDownload, FileService, StorageStats, UpdateFileInput, UploadFileInput,
    UploaderUsage,
};
pub use notification_ports::{NotificationDispatcher, TaskChange, TaskEvent, WeeklyReport};
pub use project_ports::{ProjectRepository, TaskActivity, TaskCounts, TaskListQuery, TaskRepository};
pub use project_service::{CreateProjectInput, ProjectDetails, ProjectService, UpdateProjectInput};
pub use report_service::{REPORT_WINDOW_DAYS, WeeklyReportService};
pub use task_service::{CreateTaskInput, OverdueTaskService, TaskService, UpdateTaskInput};
pub use user_ports::{PasswordHasher, StoredUser, UserRepository};
pub use user_service::{LoginOutcome, RegisterUserInput, UpdateUserInput, UserService};
