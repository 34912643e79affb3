mod auth;
mod common;
mod files;
mod projects;
mod tasks;
mod users;

pub use auth::{ChangePasswordRequest, LoginRequest, RegisterRequest};
pub use common::HealthResponse;
pub use files::{FileListParams, FileResponse, StorageStatsResponse, UpdateFileRequest};
pub use projects::{
    AddMemberRequest, CreateProjectRequest, ProjectDetailResponse, ProjectResponse,
    UpdateProjectRequest,
};
pub use tasks::{
    CreateTaskRequest, TaskListParams, TaskResponse, UpdateTaskRequest, WeeklyReportResponse,
};
pub use users::{ChangeRoleRequest, UpdateUserRequest, UserResponse};

#[cfg(test)]
mod tests {
    use taskhub_application::{ProjectDetails, TaskCounts};
    use taskhub_core::{AppResult, UserId};
    use taskhub_domain::{Project, ProjectStatus};

    use super::{CreateProjectRequest, ProjectDetailResponse};

    #[test]
    fn project_detail_flattens_project_fields() -> AppResult<()> {
        let project =
            Project::create(UserId::new(), "Apollo", "", ProjectStatus::OnHold, Vec::new())?;
        let response = ProjectDetailResponse::from(ProjectDetails {
            project,
            task_counts: TaskCounts { total: 3, done: 1 },
        });

        let value = serde_json::to_value(&response)
            .map_err(|error| taskhub_core::AppError::Internal(error.to_string()))?;
        assert_eq!(value["name"], "Apollo");
        assert_eq!(value["status"], "on_hold");
        assert_eq!(value["task_count"], 3);
        assert_eq!(value["completed_task_count"], 1);
        Ok(())
    }

    #[test]
    fn create_project_request_applies_defaults() -> AppResult<()> {
        let request: CreateProjectRequest = serde_json::from_str(r#"{"name":"Apollo"}"#)
            .map_err(|error| taskhub_core::AppError::Validation(error.to_string()))?;

        assert_eq!(request.status, ProjectStatus::Active);
        assert!(request.members.is_empty());
        assert!(request.creator.is_none());
        Ok(())
    }
}
