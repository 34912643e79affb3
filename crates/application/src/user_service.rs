//! User account use-cases.
//!
//! Owns registration, password login, profile and role administration and
//! the per-request refresh of an actor's role from storage.

use std::sync::Arc;

use taskhub_core::{AppError, AppResult, UserId};
use taskhub_domain::{AccessPolicy, UserAccount, UserProfile};

use crate::{FileStorage, PasswordHasher, UserRepository};

mod administration;
mod authentication;


/// Parameters for user registration.
#[derive(Debug, Clone)]
pub struct RegisterUserInput {
    /// Login name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
    /// Optional email address.
    pub email: Option<String>,
    /// Profile fields.
    pub profile: UserProfile,
}

/// Editable account fields.
#[derive(Debug, Clone)]
pub struct UpdateUserInput {
    /// Optional email address.
    pub email: Option<String>,
    /// Profile fields.
    pub profile: UserProfile,
}

/// Result of a login attempt.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Credentials matched. A session can be established.
    Authenticated(UserAccount),
    /// Unknown user or wrong password. Deliberately indistinguishable.
    Failed,
}

/// Application service for user accounts.
#[derive(Clone)]
pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    file_storage: Arc<dyn FileStorage>,
    policy: AccessPolicy,
}

impl UserService {
    /// Creates a new user service.
    #[must_use]
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        file_storage: Arc<dyn FileStorage>,
        policy: AccessPolicy,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
            file_storage,
            policy,
        }
    }

    async fn require_account(&self, user_id: UserId) -> AppResult<UserAccount> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .map(|stored| stored.account)
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))
    }
}
