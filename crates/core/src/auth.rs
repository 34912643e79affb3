use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AppError, UserId};

/// Privilege role carried by every user account.
///
/// Roles form a strict total order: `Admin` includes every `Manager`
/// privilege, which includes every `Employee` privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular staff member.
    Employee,
    /// Project manager.
    Manager,
    /// Administrator.
    Admin,
}

impl Role {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Returns the privilege ordinal derived from the role.
    #[must_use]
    pub fn privilege_tier(&self) -> u8 {
        match self {
            Self::Employee => 0,
            Self::Manager => 1,
            Self::Admin => 2,
        }
    }

    /// Returns whether this role carries at least the privileges of `other`.
    #[must_use]
    pub fn at_least(&self, other: Role) -> bool {
        self.privilege_tier() >= other.privilege_tier()
    }

    /// Returns all known roles in ascending privilege order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[Role::Employee, Role::Manager, Role::Admin];

        ALL
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "employee" => Ok(Self::Employee),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}

/// User information persisted in the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    user_id: UserId,
    username: String,
    role: Role,
}

impl UserIdentity {
    /// Creates a user identity from account data.
    #[must_use]
    pub fn new(user_id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
        }
    }

    /// Returns the account identifier.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the login name.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the role captured for this identity.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns a copy of the identity carrying a different role.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}
