//! User account types and validation rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhub_core::{AppError, AppResult, Role, UserId, UserIdentity};

/// Minimum accepted password length.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Maximum password length, leaves room for passphrases.
pub const PASSWORD_MAX_LENGTH: usize = 128;

/// Maximum username length.
pub const USERNAME_MAX_LENGTH: usize = 150;

/// Validated login name.
///
/// Letters, digits and `@ . + - _` only, matching the classic account
/// naming rules users already know.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Creates a validated username.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(AppError::Validation("username must not be empty".to_owned()));
        }

        if trimmed.chars().count() > USERNAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "username must not exceed {USERNAME_MAX_LENGTH} characters"
            )));
        }

        if let Some(invalid) = trimmed
            .chars()
            .find(|character| !(character.is_alphanumeric() || "@.+-_".contains(*character)))
        {
            return Err(AppError::Validation(format!(
                "username contains invalid character '{invalid}'"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the username string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated, lower-cased email address.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if local.is_empty() || domain.contains('@') {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Optional descriptive fields on a user account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact phone.
    pub phone: Option<String>,
    /// Department name.
    pub department: Option<String>,
    /// Job title.
    pub position: Option<String>,
    /// Free-form biography.
    pub bio: Option<String>,
}

impl UserProfile {
    /// Returns "first last", falling back to whichever part is present.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_owned()
    }
}

/// A registered user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    id: UserId,
    username: Username,
    email: Option<EmailAddress>,
    role: Role,
    profile: UserProfile,
    date_joined: DateTime<Utc>,
}

impl UserAccount {
    /// Registers a new account. Every account starts as an employee.
    #[must_use]
    pub fn register(username: Username, email: Option<EmailAddress>, profile: UserProfile) -> Self {
        Self {
            id: UserId::new(),
            username,
            email,
            role: Role::Employee,
            profile,
            date_joined: Utc::now(),
        }
    }

    /// Returns the account identifier.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the login name.
    #[must_use]
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Returns the email address, if any.
    #[must_use]
    pub fn email(&self) -> Option<&EmailAddress> {
        self.email.as_ref()
    }

    /// Returns the current role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns profile fields.
    #[must_use]
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Returns the registration timestamp.
    #[must_use]
    pub fn date_joined(&self) -> DateTime<Utc> {
        self.date_joined
    }

    /// Returns the session identity for this account.
    #[must_use]
    pub fn identity(&self) -> UserIdentity {
        UserIdentity::new(self.id, self.username.as_str(), self.role)
    }

    /// Replaces profile fields and email.
    pub fn update_profile(&mut self, email: Option<EmailAddress>, profile: UserProfile) {
        self.email = email;
        self.profile = profile;
    }

    /// Changes the role. Callers must have authorized the change.
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }
}

/// Validates a plaintext password.
///
/// - Length must be within `PASSWORD_MIN_LENGTH..=PASSWORD_MAX_LENGTH`.
/// - Common breached passwords are rejected.
pub fn validate_password(password: &str) -> AppResult<()> {
    let char_count = password.chars().count();

    if char_count < PASSWORD_MIN_LENGTH {
        return Err(AppError::Validation(format!(
            "password must be at least {PASSWORD_MIN_LENGTH} characters"
        )));
    }

    if char_count > PASSWORD_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "password must not exceed {PASSWORD_MAX_LENGTH} characters"
        )));
    }

    let lowered = password.to_lowercase();
    if COMMON_PASSWORDS.iter().any(|entry| *entry == lowered) {
        return Err(AppError::Validation(
            "this password is too common and has appeared in data breaches".to_owned(),
        ));
    }

    Ok(())
}

static COMMON_PASSWORDS: &[&str] = &[
    "password",
    "12345678",
    "123456789",
    "1234567890",
    "qwerty123",
    "qwertyuiop",
    "password1",
    "password123",
    "iloveyou",
    "sunshine",
    "princess",
    "football",
    "baseball",
    "superman",
    "trustno1",
    "starwars",
    "passw0rd",
    "whatever",
    "11111111",
    "00000000",
];
