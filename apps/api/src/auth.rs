//! Session-backed username/password authentication.

mod password;
mod session;

pub use password::{change_password_handler, login_handler, register_handler};
pub use session::{logout_handler, me_handler};

/// Session key holding the serialized `UserIdentity`.
pub const SESSION_USER_KEY: &str = "user_identity";
