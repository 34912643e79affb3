//! Task use-cases with default ownership, membership checks and change
//! notifications.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use taskhub_core::{AppError, AppResult, ProjectId, TaskId, UserId};
use taskhub_domain::{
    AccessPolicy, Actor, Operation, Project, Resource, ResourceKind, Task, TaskDetails,
};
use tracing::{info, warn};

use crate::access::{
    LoadedTask, not_found, require_authenticated, require_collection, require_decision,
    require_object,
};
use crate::{
    FileStorage, NotificationDispatcher, ProjectRepository, TaskChange, TaskEvent, TaskListQuery,
    TaskRepository,
};


/// Input payload for task creation.
#[derive(Debug, Clone)]
pub struct CreateTaskInput {
    /// Owning project.
    pub project_id: ProjectId,
    /// Editable fields.
    pub details: TaskDetails,
    /// Explicit assignee. Defaults to the actor when the actor is a member.
    pub assignee: Option<UserId>,
}

/// Input payload for a full task update.
#[derive(Debug, Clone)]
pub struct UpdateTaskInput {
    /// Editable fields.
    pub details: TaskDetails,
    /// New assignee, `None` to unassign.
    pub assignee: Option<UserId>,
}

/// Application service for tasks.
#[derive(Clone)]
pub struct TaskService {
    project_repository: Arc<dyn ProjectRepository>,
    task_repository: Arc<dyn TaskRepository>,
    file_storage: Arc<dyn FileStorage>,
    notification_dispatcher: Arc<dyn NotificationDispatcher>,
    policy: AccessPolicy,
}

impl TaskService {
    /// Creates a new task service.
    #[must_use]
    pub fn new(
        project_repository: Arc<dyn ProjectRepository>,
        task_repository: Arc<dyn TaskRepository>,
        file_storage: Arc<dyn FileStorage>,
        notification_dispatcher: Arc<dyn NotificationDispatcher>,
        policy: AccessPolicy,
    ) -> Self {
        Self {
            project_repository,
            task_repository,
            file_storage,
            notification_dispatcher,
            policy,
        }
    }

    /// Lists tasks visible to the actor that satisfy `query`.
    pub async fn list_tasks(&self, actor: &Actor, query: TaskListQuery) -> AppResult<Vec<Task>> {
        require_collection(&self.policy, actor, Operation::List, ResourceKind::Task)?;
        let visibility = self.policy.visible_set(actor, ResourceKind::Task);
        self.task_repository.list(&visibility, &query).await
    }

    /// Returns one task.
    pub async fn get_task(&self, actor: &Actor, task_id: TaskId) -> AppResult<Task> {
        let loaded = self
            .load_authorized(actor, Operation::Retrieve, task_id)
            .await?;
        Ok(loaded.task)
    }

    /// Creates a task. The creator is the actor; the assignee defaults to
    /// the actor when the actor is a member of the project.
    pub async fn create_task(&self, actor: &Actor, input: CreateTaskInput) -> AppResult<Task> {
        require_authenticated(actor)?;
        let creator = actor
            .user_id()
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

        let project = self.require_project(input.project_id).await?;
        if !self
            .policy
            .visible_set(actor, ResourceKind::Project)
            .admits_project(&project)
        {
            return Err(not_found(ResourceKind::Project, input.project_id));
        }
        require_decision(
            self.policy.authorize(
                actor,
                Operation::Create,
                ResourceKind::Task,
                Some(Resource::Project(&project)),
            ),
            actor,
            Operation::Create,
            ResourceKind::Task,
        )?;

        let assignee = input
            .assignee
            .or_else(|| project.is_member(creator).then_some(creator));
        let task = Task::create(&project, creator, input.details, assignee, today())?;
        self.task_repository.insert(task.clone()).await?;
        info!(task_id = %task.id(), project_id = %project.id(), creator = %creator, "task created");

        if let Some(assignee) = task.assignee() {
            self.notify(TaskEvent::Created {
                task: task.clone(),
                assignee,
            })
            .await;
        }

        Ok(task)
    }

    /// Replaces task fields and the assignee, then notifies about the
    /// fields that changed.
    pub async fn update_task(
        &self,
        actor: &Actor,
        task_id: TaskId,
        input: UpdateTaskInput,
    ) -> AppResult<Task> {
        let LoadedTask { task, project } = self
            .load_authorized(actor, Operation::Update, task_id)
            .await?;

        let before = task.clone();
        let mut after = task;
        after.update_details(input.details, today())?;
        after.assign(&project, input.assignee)?;
        self.task_repository.save(after.clone()).await?;

        let change = TaskChange { before, after };
        for event in change.events() {
            self.notify(event).await;
        }

        Ok(change.after)
    }

    /// Deletes a task with its attachments.
    pub async fn delete_task(&self, actor: &Actor, task_id: TaskId) -> AppResult<()> {
        self.load_authorized(actor, Operation::Delete, task_id).await?;

        let removed_files = self.task_repository.delete(task_id).await?;
        for file in removed_files {
            if let Err(error) = self.file_storage.remove(file.storage_path()).await {
                warn!(
                    file_id = %file.id(),
                    error = %error,
                    "failed to remove blob of deleted task"
                );
            }
        }
        info!(task_id = %task_id, deleted_by = ?actor.user_id(), "task deleted");

        Ok(())
    }

    async fn load_authorized(
        &self,
        actor: &Actor,
        operation: Operation,
        task_id: TaskId,
    ) -> AppResult<LoadedTask> {
        require_authenticated(actor)?;
        let task = self
            .task_repository
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| not_found(ResourceKind::Task, task_id))?;
        let project = self
            .project_repository
            .find_by_id(task.project_id())
            .await?
            .ok_or_else(|| not_found(ResourceKind::Task, task_id))?;

        let loaded = LoadedTask { task, project };
        require_object(
            &self.policy,
            actor,
            operation,
            Resource::Task(loaded.scope()),
            task_id,
        )?;
        Ok(loaded)
    }

    async fn require_project(&self, project_id: ProjectId) -> AppResult<Project> {
        self.project_repository
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| not_found(ResourceKind::Project, project_id))
    }

    async fn notify(&self, event: TaskEvent) {
        let name = event.as_str();
        let task_id = event.task().id();
        if let Err(error) = self.notification_dispatcher.dispatch(event).await {
            warn!(event = name, task_id = %task_id, error = %error, "notification dispatch failed");
        }
    }
}

/// Scans for overdue tasks and notifies their assignees.
#[derive(Clone)]
pub struct OverdueTaskService {
    task_repository: Arc<dyn TaskRepository>,
    notification_dispatcher: Arc<dyn NotificationDispatcher>,
}

impl OverdueTaskService {
    /// Creates a new overdue scan service.
    #[must_use]
    pub fn new(
        task_repository: Arc<dyn TaskRepository>,
        notification_dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            task_repository,
            notification_dispatcher,
        }
    }

    /// Dispatches one overdue event per assigned overdue task on `today`.
    /// Returns the number of events dispatched.
    pub async fn scan(&self, today: NaiveDate) -> AppResult<usize> {
        let overdue = self.task_repository.list_overdue(today).await?;
        let mut dispatched = 0;

        for task in overdue {
            if task.assignee().is_none() {
                continue;
            }

            let days_overdue = task.days_overdue(today);
            let task_id = task.id();
            match self
                .notification_dispatcher
                .dispatch(TaskEvent::Overdue { task, days_overdue })
                .await
            {
                Ok(()) => dispatched += 1,
                Err(error) => {
                    warn!(task_id = %task_id, error = %error, "overdue notification failed");
                }
            }
        }

        info!(dispatched, "overdue task scan finished");
        Ok(dispatched)
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
