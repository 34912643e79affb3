use taskhub_core::{Role, UserIdentity};
use taskhub_domain::{Actor, EmailAddress, Username, validate_password};
use tracing::info;

use crate::access::require_authenticated;

use super::*;

impl UserService {
    /// Registers a new employee account.
    pub async fn register(&self, input: RegisterUserInput) -> AppResult<UserAccount> {
        let username = Username::new(input.username)?;
        let email = input
            .email
            .filter(|value| !value.trim().is_empty())
            .map(EmailAddress::new)
            .transpose()?;
        validate_password(&input.password)?;

        if self
            .user_repository
            .find_by_username(username.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "username '{}' is already taken",
                username.as_str()
            )));
        }

        let password_hash = self.password_hasher.hash_password(&input.password)?;
        let account = UserAccount::register(username, email, input.profile);
        self.user_repository
            .create(account.clone(), password_hash)
            .await?;

        info!(user_id = %account.id(), username = account.username().as_str(), "user registered");
        Ok(account)
    }

    /// Verifies a username/password pair.
    ///
    /// Unknown users still pay for one hash so response timing does not
    /// reveal which usernames exist.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginOutcome> {
        let Some(stored) = self.user_repository.find_by_username(username.trim()).await? else {
            let _ = self.password_hasher.hash_password(password);
            return Ok(LoginOutcome::Failed);
        };

        if !self
            .password_hasher
            .verify_password(password, &stored.password_hash)?
        {
            return Ok(LoginOutcome::Failed);
        }

        Ok(LoginOutcome::Authenticated(stored.account))
    }

    /// Rebuilds the actor for a session identity from the stored account.
    ///
    /// Role changes and deletions take effect on the next request. A session
    /// whose account no longer exists yields an anonymous actor.
    pub async fn resolve_actor(&self, identity: &UserIdentity) -> AppResult<Actor> {
        let stored = self.user_repository.find_by_id(identity.user_id()).await?;
        Ok(Actor::from_identity(
            stored.map(|stored| stored.account.identity()),
        ))
    }

    /// Returns the actor's own account.
    pub async fn current_account(&self, actor: &Actor) -> AppResult<UserAccount> {
        require_authenticated(actor)?;
        let user_id = actor
            .user_id()
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
        self.require_account(user_id).await
    }

    /// Changes the actor's own password after verifying the current one.
    pub async fn change_password(
        &self,
        actor: &Actor,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user_id = actor
            .user_id()
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
        let stored = self
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))?;

        if !self
            .password_hasher
            .verify_password(current_password, &stored.password_hash)?
        {
            return Err(AppError::Unauthorized(
                "current password is incorrect".to_owned(),
            ));
        }

        validate_password(new_password)?;
        let password_hash = self.password_hasher.hash_password(new_password)?;
        self.user_repository
            .update_password(user_id, password_hash)
            .await
    }

    /// Ensures an administrator account exists for first-time setup.
    ///
    /// An existing account with the same username is promoted; its password
    /// is left untouched.
    pub async fn bootstrap_admin(&self, username: &str, password: &str) -> AppResult<UserAccount> {
        if let Some(stored) = self.user_repository.find_by_username(username).await? {
            let mut account = stored.account;
            if account.role() != Role::Admin {
                account.set_role(Role::Admin);
                self.user_repository.save(account.clone()).await?;
                info!(user_id = %account.id(), "existing account promoted to admin");
            }
            return Ok(account);
        }

        let mut account = self
            .register(RegisterUserInput {
                username: username.to_owned(),
                password: password.to_owned(),
                email: None,
                profile: UserProfile::default(),
            })
            .await?;
        account.set_role(Role::Admin);
        self.user_repository.save(account.clone()).await?;
        info!(user_id = %account.id(), "bootstrap admin created");

        Ok(account)
    }
}
