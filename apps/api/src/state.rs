use taskhub_application::{
    FileService, ProjectService, TaskService, UserService, WeeklyReportService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub project_service: ProjectService,
    pub task_service: TaskService,
    pub file_service: FileService,
    pub report_service: WeeklyReportService,
    pub frontend_url: String,
    pub max_upload_bytes: u64,
}
