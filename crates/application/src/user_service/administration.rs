use taskhub_core::Role;
use taskhub_domain::{Actor, EmailAddress, Operation, Resource, ResourceKind};
use tracing::{info, warn};

use crate::access::{
    not_found, require_authenticated, require_collection, require_decision, require_object,
};

use super::*;

impl UserService {
    /// Lists accounts visible to the actor. Non-admins see only themselves.
    pub async fn list_users(&self, actor: &Actor) -> AppResult<Vec<UserAccount>> {
        require_collection(&self.policy, actor, Operation::List, ResourceKind::User)?;
        let visibility = self.policy.visible_set(actor, ResourceKind::User);
        self.user_repository.list(&visibility).await
    }

    /// Returns one account.
    pub async fn get_user(&self, actor: &Actor, user_id: UserId) -> AppResult<UserAccount> {
        let account = self.load_visible(actor, user_id).await?;
        require_object(
            &self.policy,
            actor,
            Operation::Retrieve,
            Resource::User(&account),
            user_id,
        )?;
        Ok(account)
    }

    /// Replaces profile fields of one account.
    pub async fn update_user(
        &self,
        actor: &Actor,
        user_id: UserId,
        input: UpdateUserInput,
    ) -> AppResult<UserAccount> {
        let mut account = self.load_visible(actor, user_id).await?;
        require_object(
            &self.policy,
            actor,
            Operation::Update,
            Resource::User(&account),
            user_id,
        )?;

        let email = input
            .email
            .filter(|value| !value.trim().is_empty())
            .map(EmailAddress::new)
            .transpose()?;
        account.update_profile(email, input.profile);
        self.user_repository.save(account.clone()).await?;

        Ok(account)
    }

    /// Sets the role of another account.
    pub async fn change_role(
        &self,
        actor: &Actor,
        user_id: UserId,
        role: Role,
    ) -> AppResult<UserAccount> {
        let mut account = self.load_visible(actor, user_id).await?;
        require_decision(
            self.policy.authorize_role_change(actor, &account),
            actor,
            Operation::Update,
            ResourceKind::User,
        )?;

        let previous = account.role();
        account.set_role(role);
        self.user_repository.save(account.clone()).await?;
        info!(
            user_id = %user_id,
            from = previous.as_str(),
            to = role.as_str(),
            changed_by = ?actor.user_id(),
            "user role changed"
        );

        Ok(account)
    }

    /// Deletes an account and everything it owns.
    pub async fn delete_user(&self, actor: &Actor, user_id: UserId) -> AppResult<()> {
        let account = self.load_visible(actor, user_id).await?;
        require_object(
            &self.policy,
            actor,
            Operation::Delete,
            Resource::User(&account),
            user_id,
        )?;

        if actor.is(user_id) {
            return Err(AppError::Conflict(
                "administrators cannot delete their own account".to_owned(),
            ));
        }

        let removed_files = self.user_repository.delete(user_id).await?;
        for file in removed_files {
            if let Err(error) = self.file_storage.remove(file.storage_path()).await {
                warn!(
                    file_id = %file.id(),
                    error = %error,
                    "failed to remove blob of deleted user"
                );
            }
        }
        info!(user_id = %user_id, deleted_by = ?actor.user_id(), "user deleted");

        Ok(())
    }

    /// Loads an account, reporting both missing and invisible accounts as
    /// not found. Anonymous actors are rejected first.
    async fn load_visible(&self, actor: &Actor, user_id: UserId) -> AppResult<UserAccount> {
        require_authenticated(actor)?;
        let account = self.require_account(user_id).await?;
        if !self
            .policy
            .visible_set(actor, ResourceKind::User)
            .admits_user(&account)
        {
            return Err(not_found(ResourceKind::User, user_id));
        }
        Ok(account)
    }
}
