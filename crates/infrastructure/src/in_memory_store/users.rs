use async_trait::async_trait;
use taskhub_application::{StoredUser, UserRepository};
use taskhub_core::{AppError, AppResult, UserId};
use taskhub_domain::{FileAttachment, Project, UserAccount, Visibility};

use super::InMemoryStore;

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<StoredUser>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<StoredUser>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|stored| {
                stored
                    .account
                    .username()
                    .as_str()
                    .eq_ignore_ascii_case(username)
            })
            .cloned())
    }

    async fn list(&self, visibility: &Visibility) -> AppResult<Vec<UserAccount>> {
        let state = self.state.read().await;
        let mut accounts: Vec<UserAccount> = state
            .users
            .values()
            .filter(|stored| visibility.admits_user(&stored.account))
            .map(|stored| stored.account.clone())
            .collect();
        accounts.sort_by(|left, right| {
            left.username()
                .as_str()
                .to_lowercase()
                .cmp(&right.username().as_str().to_lowercase())
        });

        Ok(accounts)
    }

    async fn create(&self, account: UserAccount, password_hash: String) -> AppResult<()> {
        let mut state = self.state.write().await;
        let username = account.username().as_str();

        if state.users.values().any(|stored| {
            stored
                .account
                .username()
                .as_str()
                .eq_ignore_ascii_case(username)
        }) {
            return Err(AppError::Conflict(format!(
                "username '{username}' is already taken"
            )));
        }

        state.users.insert(
            account.id(),
            StoredUser {
                account,
                password_hash,
            },
        );
        Ok(())
    }

    async fn save(&self, account: UserAccount) -> AppResult<()> {
        let mut state = self.state.write().await;
        let stored = state.users.get_mut(&account.id()).ok_or_else(|| {
            AppError::NotFound(format!("user '{}' does not exist", account.id()))
        })?;

        stored.account = account;
        Ok(())
    }

    async fn update_password(&self, user_id: UserId, password_hash: String) -> AppResult<()> {
        let mut state = self.state.write().await;
        let stored = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))?;

        stored.password_hash = password_hash;
        Ok(())
    }

    async fn delete(&self, user_id: UserId) -> AppResult<Vec<FileAttachment>> {
        let mut state = self.state.write().await;
        if state.users.remove(&user_id).is_none() {
            return Err(AppError::NotFound(format!("user '{user_id}' does not exist")));
        }

        let created: Vec<_> = state
            .projects
            .values()
            .filter(|project| project.creator() == user_id)
            .map(Project::id)
            .collect();
        let mut removed = Vec::new();
        for project_id in created {
            removed.extend(state.remove_project_cascade(project_id));
        }

        for project in state.projects.values_mut() {
            if project.is_member(user_id) {
                project.remove_member(user_id)?;
            }
        }
        for task in state.tasks.values_mut() {
            if task.assignee() == Some(user_id) {
                task.unassign();
            }
        }
        removed.extend(
            state.drain_files(|file| file.uploaded_by() == user_id || file.user() == Some(user_id)),
        );

        Ok(removed)
    }
}
