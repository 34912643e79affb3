//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod in_memory_store;
mod local_file_storage;
mod log_notification_dispatcher;

pub use argon2_password_hasher::{Argon2PasswordHasher, DEFAULT_ARGON2_COST};
pub use in_memory_store::InMemoryStore;
pub use local_file_storage::LocalFileStorage;
pub use log_notification_dispatcher::LogNotificationDispatcher;
