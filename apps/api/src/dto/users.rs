use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhub_application::UpdateUserInput;
use taskhub_core::{Role, UserId};
use taskhub_domain::{UserAccount, UserProfile};

/// API representation of a user account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub bio: Option<String>,
    pub date_joined: DateTime<Utc>,
}

impl From<UserAccount> for UserResponse {
    fn from(account: UserAccount) -> Self {
        let profile = account.profile().clone();
        Self {
            id: account.id(),
            username: account.username().as_str().to_owned(),
            email: account.email().map(|email| email.as_str().to_owned()),
            role: account.role(),
            full_name: profile.full_name(),
            first_name: profile.first_name,
            last_name: profile.last_name,
            phone: profile.phone,
            department: profile.department,
            position: profile.position,
            bio: profile.bio,
            date_joined: account.date_joined(),
        }
    }
}

/// Incoming payload for profile updates. Omitted fields are cleared.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub bio: Option<String>,
}

impl From<UpdateUserRequest> for UpdateUserInput {
    fn from(request: UpdateUserRequest) -> Self {
        Self {
            email: request.email,
            profile: UserProfile {
                first_name: request.first_name,
                last_name: request.last_name,
                phone: request.phone,
                department: request.department,
                position: request.position,
                bio: request.bio,
            },
        }
    }
}

/// Incoming payload for role changes.
#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
}
