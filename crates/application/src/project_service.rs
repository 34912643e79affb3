//! Project use-cases: listing, lifecycle and membership.

use std::sync::Arc;

use taskhub_core::{AppError, AppResult, ProjectId, UserId};
use taskhub_domain::{
    AccessPolicy, Actor, Operation, Project, ProjectStatus, Resource, ResourceKind,
};
use tracing::{info, warn};

use crate::access::{
    not_found, require_authenticated, require_collection, require_decision, require_object,
};
use crate::{FileStorage, ProjectRepository, TaskCounts, TaskRepository, UserRepository};


/// Input payload for project creation. The creator is always the actor.
#[derive(Debug, Clone)]
pub struct CreateProjectInput {
    /// Project name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Initial status.
    pub status: ProjectStatus,
    /// Initial members besides the creator.
    pub members: Vec<UserId>,
}

/// Editable project fields.
#[derive(Debug, Clone)]
pub struct UpdateProjectInput {
    /// Project name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Status.
    pub status: ProjectStatus,
}

/// A project with its task totals.
#[derive(Debug, Clone)]
pub struct ProjectDetails {
    /// The project.
    pub project: Project,
    /// Task totals.
    pub task_counts: TaskCounts,
}

/// Application service for projects.
#[derive(Clone)]
pub struct ProjectService {
    project_repository: Arc<dyn ProjectRepository>,
    task_repository: Arc<dyn TaskRepository>,
    user_repository: Arc<dyn UserRepository>,
    file_storage: Arc<dyn FileStorage>,
    policy: AccessPolicy,
}

impl ProjectService {
    /// Creates a new project service.
    #[must_use]
    pub fn new(
        project_repository: Arc<dyn ProjectRepository>,
        task_repository: Arc<dyn TaskRepository>,
        user_repository: Arc<dyn UserRepository>,
        file_storage: Arc<dyn FileStorage>,
        policy: AccessPolicy,
    ) -> Self {
        Self {
            project_repository,
            task_repository,
            user_repository,
            file_storage,
            policy,
        }
    }

    /// Lists projects visible to the actor.
    pub async fn list_projects(&self, actor: &Actor) -> AppResult<Vec<Project>> {
        require_collection(&self.policy, actor, Operation::List, ResourceKind::Project)?;
        let visibility = self.policy.visible_set(actor, ResourceKind::Project);
        self.project_repository.list(&visibility).await
    }

    /// Returns one project with its task totals.
    pub async fn get_project(
        &self,
        actor: &Actor,
        project_id: ProjectId,
    ) -> AppResult<ProjectDetails> {
        let project = self
            .load_authorized(actor, Operation::Retrieve, project_id)
            .await?;
        let task_counts = self.task_repository.count_for_project(project_id).await?;

        Ok(ProjectDetails {
            project,
            task_counts,
        })
    }

    /// Creates a project owned by the actor.
    pub async fn create_project(
        &self,
        actor: &Actor,
        input: CreateProjectInput,
    ) -> AppResult<Project> {
        require_collection(&self.policy, actor, Operation::Create, ResourceKind::Project)?;
        let creator = actor
            .user_id()
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

        for member in &input.members {
            self.require_user_exists(*member).await?;
        }

        let project = Project::create(
            creator,
            input.name,
            input.description,
            input.status,
            input.members,
        )?;
        self.project_repository.insert(project.clone()).await?;
        info!(project_id = %project.id(), creator = %creator, "project created");

        Ok(project)
    }

    /// Updates descriptive project fields.
    pub async fn update_project(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        input: UpdateProjectInput,
    ) -> AppResult<Project> {
        self.load_authorized(actor, Operation::Update, project_id).await?;

        self.project_repository
            .update_details(project_id, input.name, input.description, input.status)
            .await
    }

    /// Deletes a project with its tasks and attachments.
    pub async fn delete_project(&self, actor: &Actor, project_id: ProjectId) -> AppResult<()> {
        self.load_authorized(actor, Operation::Delete, project_id).await?;

        let removed_files = self.project_repository.delete(project_id).await?;
        for file in removed_files {
            if let Err(error) = self.file_storage.remove(file.storage_path()).await {
                warn!(
                    file_id = %file.id(),
                    error = %error,
                    "failed to remove blob of deleted project"
                );
            }
        }
        info!(project_id = %project_id, deleted_by = ?actor.user_id(), "project deleted");

        Ok(())
    }

    /// Adds a member. Only the creator or an administrator may do so.
    pub async fn add_member(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        user_id: UserId,
    ) -> AppResult<Project> {
        self.load_for_membership_change(actor, project_id).await?;
        self.require_user_exists(user_id).await?;

        let (project, added) = self
            .project_repository
            .add_member(project_id, user_id)
            .await?;
        if added {
            info!(project_id = %project_id, user_id = %user_id, "project member added");
        }

        Ok(project)
    }

    /// Removes a member. Fails with `Conflict` for the creator and for
    /// users still assigned to tasks of the project.
    pub async fn remove_member(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        user_id: UserId,
    ) -> AppResult<Project> {
        let project = self.load_for_membership_change(actor, project_id).await?;
        if !project.is_member(user_id) {
            return Err(AppError::NotFound(format!(
                "user '{user_id}' is not a member of project '{project_id}'"
            )));
        }

        let project = self
            .project_repository
            .remove_member(project_id, user_id)
            .await?;
        info!(project_id = %project_id, user_id = %user_id, "project member removed");

        Ok(project)
    }

    async fn load_authorized(
        &self,
        actor: &Actor,
        operation: Operation,
        project_id: ProjectId,
    ) -> AppResult<Project> {
        require_authenticated(actor)?;
        let project = self.require_project(project_id).await?;
        require_object(
            &self.policy,
            actor,
            operation,
            Resource::Project(&project),
            project_id,
        )?;
        Ok(project)
    }

    async fn load_for_membership_change(
        &self,
        actor: &Actor,
        project_id: ProjectId,
    ) -> AppResult<Project> {
        require_authenticated(actor)?;
        let project = self.require_project(project_id).await?;
        if !self
            .policy
            .visible_set(actor, ResourceKind::Project)
            .admits_project(&project)
        {
            return Err(not_found(ResourceKind::Project, project_id));
        }

        require_decision(
            self.policy.authorize_membership_change(actor, &project),
            actor,
            Operation::Update,
            ResourceKind::Project,
        )?;
        Ok(project)
    }

    async fn require_project(&self, project_id: ProjectId) -> AppResult<Project> {
        self.project_repository
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| not_found(ResourceKind::Project, project_id))
    }

    async fn require_user_exists(&self, user_id: UserId) -> AppResult<()> {
        if self.user_repository.find_by_id(user_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "user '{user_id}' does not exist"
            )));
        }
        Ok(())
    }
}
