use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use taskhub_application::{TaskActivity, TaskCounts, TaskListQuery, TaskRepository};
use taskhub_core::{AppError, AppResult, ProjectId, TaskId};
use taskhub_domain::{FileAttachment, Task, TaskStatus, Visibility};

use super::InMemoryStore;

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn find_by_id(&self, task_id: TaskId) -> AppResult<Option<Task>> {
        Ok(self.state.read().await.tasks.get(&task_id).cloned())
    }

    async fn list(&self, visibility: &Visibility, query: &TaskListQuery) -> AppResult<Vec<Task>> {
        let state = self.state.read().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| query.matches(task) && state.task_visible(visibility, task))
            .cloned()
            .collect();
        tasks.sort_by(|left, right| right.created_at().cmp(&left.created_at()));

        Ok(tasks)
    }

    async fn count_for_project(&self, project_id: ProjectId) -> AppResult<TaskCounts> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .values()
            .filter(|task| task.project_id() == project_id)
            .fold(TaskCounts::default(), |mut counts, task| {
                counts.total += 1;
                if task.status() == TaskStatus::Done {
                    counts.done += 1;
                }
                counts
            }))
    }

    async fn activity_since(&self, since: DateTime<Utc>) -> AppResult<TaskActivity> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .values()
            .fold(TaskActivity::default(), |activity, task| activity.record(task, since)))
    }

    async fn list_overdue(&self, today: NaiveDate) -> AppResult<Vec<Task>> {
        let state = self.state.read().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.is_overdue(today))
            .cloned()
            .collect();
        tasks.sort_by_key(Task::due_date);

        Ok(tasks)
    }

    async fn insert(&self, task: Task) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.tasks.contains_key(&task.id()) {
            return Err(AppError::Conflict(format!(
                "task '{}' already exists",
                task.id()
            )));
        }
        state.check_task_membership(&task)?;

        state.tasks.insert(task.id(), task);
        Ok(())
    }

    async fn save(&self, task: Task) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.tasks.contains_key(&task.id()) {
            return Err(AppError::NotFound(format!(
                "task '{}' does not exist",
                task.id()
            )));
        }
        state.check_task_membership(&task)?;

        state.tasks.insert(task.id(), task);
        Ok(())
    }

    async fn delete(&self, task_id: TaskId) -> AppResult<Vec<FileAttachment>> {
        let mut state = self.state.write().await;
        if !state.tasks.contains_key(&task_id) {
            return Err(AppError::NotFound(format!("task '{task_id}' does not exist")));
        }

        Ok(state.remove_task_cascade(task_id))
    }
}
