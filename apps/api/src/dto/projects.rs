use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhub_application::{ProjectDetails, UpdateProjectInput};
use taskhub_core::{ProjectId, UserId};
use taskhub_domain::{Project, ProjectStatus};

/// Incoming payload for project creation.
///
/// `creator` is accepted only so that a forged value can be detected and
/// logged; the creator is always the caller.
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_project_status")]
    pub status: ProjectStatus,
    #[serde(default)]
    pub members: Vec<UserId>,
    #[serde(default)]
    pub creator: Option<UserId>,
}

/// Incoming payload for project updates.
#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_project_status")]
    pub status: ProjectStatus,
    #[serde(default)]
    pub creator: Option<UserId>,
}

impl From<UpdateProjectRequest> for UpdateProjectInput {
    fn from(request: UpdateProjectRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            status: request.status,
        }
    }
}

/// Incoming payload for adding a project member.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: UserId,
}

fn default_project_status() -> ProjectStatus {
    ProjectStatus::Active
}

/// API representation of a project.
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub creator: UserId,
    pub members: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id(),
            name: project.name().as_str().to_owned(),
            description: project.description().to_owned(),
            status: project.status(),
            creator: project.creator(),
            members: project.members().iter().copied().collect(),
            created_at: project.created_at(),
            updated_at: project.updated_at(),
        }
    }
}

/// Project with task totals.
#[derive(Debug, Serialize)]
pub struct ProjectDetailResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,
    pub task_count: usize,
    pub completed_task_count: usize,
}

impl From<ProjectDetails> for ProjectDetailResponse {
    fn from(details: ProjectDetails) -> Self {
        Self {
            project: ProjectResponse::from(details.project),
            task_count: details.task_counts.total,
            completed_task_count: details.task_counts.done,
        }
    }
}
