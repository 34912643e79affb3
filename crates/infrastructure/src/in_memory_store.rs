//! In-memory implementation of every repository port.
//!
//! One `RwLock` guards all collections so that cascades and the
//! membership/assignee check run under a single write guard.

use std::collections::HashMap;

use taskhub_application::StoredUser;
use taskhub_core::{AppError, AppResult, FileId, ProjectId, TaskId, UserId};
use taskhub_domain::{FileAttachment, FileScope, Project, Task, TaskScope, Visibility};
use tokio::sync::RwLock;

mod files;
mod projects;
mod tasks;
mod users;

#[cfg(test)]
mod tests;

#[derive(Debug, Default)]
struct StoreState {
    users: HashMap<UserId, StoredUser>,
    projects: HashMap<ProjectId, Project>,
    tasks: HashMap<TaskId, Task>,
    files: HashMap<FileId, FileAttachment>,
}

/// In-memory store for users, projects, tasks and file metadata.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreState {
    fn task_scope<'a>(&'a self, task: &'a Task) -> Option<TaskScope<'a>> {
        self.projects
            .get(&task.project_id())
            .map(|project| TaskScope::new(task, project))
    }

    fn file_scope<'a>(&'a self, file: &'a FileAttachment) -> FileScope<'a> {
        let mut scope = FileScope::new(file);
        if let Some(project) = file.project().and_then(|id| self.projects.get(&id)) {
            scope = scope.with_project(project);
        }
        if let Some(task) = file
            .task()
            .and_then(|id| self.tasks.get(&id))
            .and_then(|task| self.task_scope(task))
        {
            scope = scope.with_task(task);
        }
        scope
    }

    fn task_visible(&self, visibility: &Visibility, task: &Task) -> bool {
        self.task_scope(task)
            .is_some_and(|scope| visibility.admits_task(scope))
    }

    fn file_visible(&self, visibility: &Visibility, file: &FileAttachment) -> bool {
        visibility.admits_file(self.file_scope(file))
    }

    /// Rejects a task whose project is missing or whose assignee is not a
    /// current member.
    fn check_task_membership(&self, task: &Task) -> AppResult<()> {
        let project = self.projects.get(&task.project_id()).ok_or_else(|| {
            AppError::NotFound(format!("project '{}' does not exist", task.project_id()))
        })?;

        match task.assignee() {
            Some(assignee) if !project.is_member(assignee) => Err(AppError::Validation(format!(
                "assignee '{assignee}' must be a member of project '{}'",
                project.id()
            ))),
            _ => Ok(()),
        }
    }

    fn remove_task_cascade(&mut self, task_id: TaskId) -> Vec<FileAttachment> {
        self.tasks.remove(&task_id);
        self.drain_files(|file| file.task() == Some(task_id))
    }

    fn remove_project_cascade(&mut self, project_id: ProjectId) -> Vec<FileAttachment> {
        self.projects.remove(&project_id);

        let mut removed = self.drain_files(|file| file.project() == Some(project_id));
        let task_ids: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|task| task.project_id() == project_id)
            .map(Task::id)
            .collect();
        for task_id in task_ids {
            removed.extend(self.remove_task_cascade(task_id));
        }

        removed
    }

    fn drain_files(&mut self, predicate: impl Fn(&FileAttachment) -> bool) -> Vec<FileAttachment> {
        let file_ids: Vec<FileId> = self
            .files
            .values()
            .filter(|file| predicate(file))
            .map(FileAttachment::id)
            .collect();

        file_ids
            .into_iter()
            .filter_map(|file_id| self.files.remove(&file_id))
            .collect()
    }
}
