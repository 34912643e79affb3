use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use taskhub_application::{TaskListQuery, WeeklyReport};
use taskhub_core::{ProjectId, TaskId, UserId};
use taskhub_domain::{Task, TaskDetails, TaskPriority, TaskStatus};

/// Incoming payload for task creation.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub project_id: ProjectId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_task_status")]
    pub status: TaskStatus,
    #[serde(default = "default_task_priority")]
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assignee: Option<UserId>,
    #[serde(default)]
    pub creator: Option<UserId>,
}

impl CreateTaskRequest {
    /// Splits out the editable task fields.
    #[must_use]
    pub fn details(&self) -> TaskDetails {
        TaskDetails {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
        }
    }
}

/// Incoming payload for task updates. The full field set is replaced.
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_task_status")]
    pub status: TaskStatus,
    #[serde(default = "default_task_priority")]
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assignee: Option<UserId>,
}

impl UpdateTaskRequest {
    /// Splits out the editable task fields.
    #[must_use]
    pub fn details(&self) -> TaskDetails {
        TaskDetails {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
        }
    }
}

fn default_task_status() -> TaskStatus {
    TaskStatus::Todo
}

fn default_task_priority() -> TaskPriority {
    TaskPriority::Medium
}

/// Query-string filters for task listing.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListParams {
    pub project: Option<ProjectId>,
    pub status: Option<TaskStatus>,
    pub assignee: Option<UserId>,
}

impl From<TaskListParams> for TaskListQuery {
    fn from(params: TaskListParams) -> Self {
        Self {
            project: params.project,
            status: params.status,
            assignee: params.assignee,
        }
    }
}

/// API representation of a task.
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub assignee: Option<UserId>,
    pub creator: UserId,
    pub is_overdue: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskResponse {
    /// Builds the response, evaluating overdue state against `today`.
    #[must_use]
    pub fn from_task(task: Task, today: NaiveDate) -> Self {
        Self {
            id: task.id(),
            project_id: task.project_id(),
            title: task.title().as_str().to_owned(),
            description: task.description().to_owned(),
            status: task.status(),
            priority: task.priority(),
            due_date: task.due_date(),
            assignee: task.assignee(),
            creator: task.creator(),
            is_overdue: task.is_overdue(today),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
            completed_at: task.completed_at(),
        }
    }
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self::from_task(task, Utc::now().date_naive())
    }
}

/// API representation of the weekly task report.
#[derive(Debug, Serialize)]
pub struct WeeklyReportResponse {
    pub since: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub created: usize,
    pub completed: usize,
    pub total: usize,
    pub active: usize,
    pub done: usize,
}

impl From<WeeklyReport> for WeeklyReportResponse {
    fn from(report: WeeklyReport) -> Self {
        Self {
            since: report.since,
            generated_at: report.generated_at,
            created: report.activity.created,
            completed: report.activity.completed,
            total: report.activity.total,
            active: report.activity.active,
            done: report.activity.finished(),
        }
    }
}
