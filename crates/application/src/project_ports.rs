use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use taskhub_core::{AppResult, ProjectId, TaskId, UserId};
use taskhub_domain::{FileAttachment, Project, ProjectStatus, Task, TaskStatus, Visibility};

/// Optional filters for task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    /// Only tasks of this project.
    pub project: Option<ProjectId>,
    /// Only tasks in this status.
    pub status: Option<TaskStatus>,
    /// Only tasks assigned to this user.
    pub assignee: Option<UserId>,
}

impl TaskListQuery {
    /// Returns whether `task` satisfies every set filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.project
            .is_none_or(|project_id| task.project_id() == project_id)
            && self.status.is_none_or(|status| task.status() == status)
            && self
                .assignee
                .is_none_or(|assignee| task.assignee() == Some(assignee))
    }
}

/// Task totals of one project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    /// All tasks.
    pub total: usize,
    /// Tasks in status `done`.
    pub done: usize,
}

/// Task totals across every project for one reporting window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskActivity {
    /// Tasks created inside the window.
    pub created: usize,
    /// Tasks that moved to `done` inside the window and are still done.
    pub completed: usize,
    /// All tasks.
    pub total: usize,
    /// Tasks not in status `done`.
    pub active: usize,
}

impl TaskActivity {
    /// Folds one task into the totals for a window starting at `since`.
    #[must_use]
    pub fn record(mut self, task: &Task, since: DateTime<Utc>) -> Self {
        self.total += 1;
        if task.created_at() >= since {
            self.created += 1;
        }
        match task.completed_at() {
            Some(completed_at) if completed_at >= since => self.completed += 1,
            Some(_) => {}
            None => self.active += 1,
        }
        self
    }

    /// Tasks in status `done`.
    #[must_use]
    pub fn finished(&self) -> usize {
        self.total - self.active
    }
}

/// Repository port for project persistence.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Finds a project by identifier.
    async fn find_by_id(&self, project_id: ProjectId) -> AppResult<Option<Project>>;

    /// Lists projects admitted by `visibility`, newest first.
    async fn list(&self, visibility: &Visibility) -> AppResult<Vec<Project>>;

    /// Inserts a new project.
    async fn insert(&self, project: Project) -> AppResult<()>;

    /// Replaces the descriptive fields of the stored project and returns
    /// the updated record. Members and creator are left untouched.
    async fn update_details(
        &self,
        project_id: ProjectId,
        name: String,
        description: String,
        status: ProjectStatus,
    ) -> AppResult<Project>;

    /// Adds `user_id` to the stored member set. Returns the updated project
    /// and whether the user was newly added.
    async fn add_member(&self, project_id: ProjectId, user_id: UserId)
    -> AppResult<(Project, bool)>;

    /// Removes `user_id` from the member set.
    ///
    /// Fails with `Conflict` when the user created the project or is still
    /// assigned to one of its tasks. The check and the removal happen
    /// atomically.
    async fn remove_member(&self, project_id: ProjectId, user_id: UserId) -> AppResult<Project>;

    /// Deletes a project with its tasks and attachments. Returns the removed
    /// file records.
    async fn delete(&self, project_id: ProjectId) -> AppResult<Vec<FileAttachment>>;
}

/// Repository port for task persistence.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Finds a task by identifier.
    async fn find_by_id(&self, task_id: TaskId) -> AppResult<Option<Task>>;

    /// Lists tasks admitted by `visibility` and `query`, newest first.
    async fn list(&self, visibility: &Visibility, query: &TaskListQuery) -> AppResult<Vec<Task>>;

    /// Counts tasks of one project regardless of visibility.
    async fn count_for_project(&self, project_id: ProjectId) -> AppResult<TaskCounts>;

    /// Summarizes all tasks for the window starting at `since`.
    async fn activity_since(&self, since: DateTime<Utc>) -> AppResult<TaskActivity>;

    /// Lists open tasks whose due date lies before `today`.
    async fn list_overdue(&self, today: NaiveDate) -> AppResult<Vec<Task>>;

    /// Inserts a new task.
    ///
    /// Fails with `Validation` when the assignee is not a member of the
    /// stored project at write time.
    async fn insert(&self, task: Task) -> AppResult<()>;

    /// Persists changes of an existing task with the same membership check
    /// as [`TaskRepository::insert`].
    async fn save(&self, task: Task) -> AppResult<()>;

    /// Deletes a task with its attachments. Returns the removed file records.
    async fn delete(&self, task_id: TaskId) -> AppResult<Vec<FileAttachment>>;
}
