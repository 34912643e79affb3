use async_trait::async_trait;

use taskhub_core::{AppResult, UserId};
use taskhub_domain::{FileAttachment, UserAccount, Visibility};

/// User account together with its credential hash.
#[derive(Debug, Clone)]
pub struct StoredUser {
    /// The account.
    pub account: UserAccount,
    /// Argon2id password hash.
    pub password_hash: String,
}

/// Repository port for user persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by identifier.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<StoredUser>>;

    /// Finds a user by username (case-insensitive).
    async fn find_by_username(&self, username: &str) -> AppResult<Option<StoredUser>>;

    /// Lists accounts admitted by `visibility`, ordered by username.
    async fn list(&self, visibility: &Visibility) -> AppResult<Vec<UserAccount>>;

    /// Inserts a new account. Fails with `Conflict` when the username is taken.
    async fn create(&self, account: UserAccount, password_hash: String) -> AppResult<()>;

    /// Persists profile and role changes of an existing account.
    async fn save(&self, account: UserAccount) -> AppResult<()>;

    /// Replaces the password hash.
    async fn update_password(&self, user_id: UserId, password_hash: String) -> AppResult<()>;

    /// Deletes an account.
    ///
    /// Projects created by the user are deleted with their tasks, the user
    /// leaves every member set, assigned tasks become unassigned and files
    /// uploaded by or owned by the user are removed. Returns the removed
    /// file records so their blobs can be cleaned up.
    async fn delete(&self, user_id: UserId) -> AppResult<Vec<FileAttachment>>;
}

/// Port for password hashing operations. Keeps domain/application free of
/// direct cryptographic library coupling.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password using Argon2id.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}
