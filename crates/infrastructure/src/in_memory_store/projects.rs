use async_trait::async_trait;
use taskhub_application::ProjectRepository;
use taskhub_core::{AppError, AppResult, ProjectId, UserId};
use taskhub_domain::{FileAttachment, Project, ProjectStatus, Visibility};

use super::InMemoryStore;

#[async_trait]
impl ProjectRepository for InMemoryStore {
    async fn find_by_id(&self, project_id: ProjectId) -> AppResult<Option<Project>> {
        Ok(self.state.read().await.projects.get(&project_id).cloned())
    }

    async fn list(&self, visibility: &Visibility) -> AppResult<Vec<Project>> {
        let state = self.state.read().await;
        let mut projects: Vec<Project> = state
            .projects
            .values()
            .filter(|project| visibility.admits_project(project))
            .cloned()
            .collect();
        projects.sort_by(|left, right| right.created_at().cmp(&left.created_at()));

        Ok(projects)
    }

    async fn insert(&self, project: Project) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.projects.contains_key(&project.id()) {
            return Err(AppError::Conflict(format!(
                "project '{}' already exists",
                project.id()
            )));
        }

        state.projects.insert(project.id(), project);
        Ok(())
    }

    async fn update_details(
        &self,
        project_id: ProjectId,
        name: String,
        description: String,
        status: ProjectStatus,
    ) -> AppResult<Project> {
        let mut state = self.state.write().await;
        let project = state
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| AppError::NotFound(format!("project '{project_id}' does not exist")))?;

        project.update_details(name, description, status)?;
        Ok(project.clone())
    }

    async fn add_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> AppResult<(Project, bool)> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Err(AppError::Validation(format!(
                "user '{user_id}' does not exist"
            )));
        }

        let project = state
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| AppError::NotFound(format!("project '{project_id}' does not exist")))?;

        let added = project.add_member(user_id);
        Ok((project.clone(), added))
    }

    async fn remove_member(&self, project_id: ProjectId, user_id: UserId) -> AppResult<Project> {
        let mut state = self.state.write().await;

        let assigned = state
            .tasks
            .values()
            .filter(|task| task.project_id() == project_id && task.assignee() == Some(user_id))
            .count();
        if assigned > 0 {
            return Err(AppError::Conflict(format!(
                "user '{user_id}' is still assigned to {assigned} task(s) in project '{project_id}'"
            )));
        }

        let project = state
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| AppError::NotFound(format!("project '{project_id}' does not exist")))?;
        project.remove_member(user_id)?;

        Ok(project.clone())
    }

    async fn delete(&self, project_id: ProjectId) -> AppResult<Vec<FileAttachment>> {
        let mut state = self.state.write().await;
        if !state.projects.contains_key(&project_id) {
            return Err(AppError::NotFound(format!(
                "project '{project_id}' does not exist"
            )));
        }

        Ok(state.remove_project_cascade(project_id))
    }
}
