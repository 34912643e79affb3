use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhub_core::{AppError, AppResult, NonEmptyString, ProjectId, UserId};

/// Maximum project name length.
pub const PROJECT_NAME_MAX_LENGTH: usize = 200;

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Work in progress.
    Active,
    /// Temporarily paused.
    OnHold,
    /// Finished.
    Completed,
    /// Kept for reference only.
    Archived,
}

impl ProjectStatus {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::OnHold => "on_hold",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "on_hold" => Ok(Self::OnHold),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            _ => Err(AppError::Validation(format!(
                "unknown project status '{value}'"
            ))),
        }
    }
}

/// A project with one immutable creator and a member set.
///
/// The creator is always a member; membership removal refuses to drop them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    name: NonEmptyString,
    description: String,
    status: ProjectStatus,
    creator: UserId,
    members: BTreeSet<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates a project owned by `creator`, who also becomes its first member.
    pub fn create(
        creator: UserId,
        name: impl Into<String>,
        description: impl Into<String>,
        status: ProjectStatus,
        members: impl IntoIterator<Item = UserId>,
    ) -> AppResult<Self> {
        let name = validate_project_name(name.into())?;
        let mut members: BTreeSet<UserId> = members.into_iter().collect();
        members.insert(creator);

        let now = Utc::now();
        Ok(Self {
            id: ProjectId::new(),
            name,
            description: description.into(),
            status,
            creator,
            members,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the project identifier.
    #[must_use]
    pub fn id(&self) -> ProjectId {
        self.id
    }

    /// Returns the project name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> ProjectStatus {
        self.status
    }

    /// Returns the creator.
    #[must_use]
    pub fn creator(&self) -> UserId {
        self.creator
    }

    /// Returns the member set.
    #[must_use]
    pub fn members(&self) -> &BTreeSet<UserId> {
        &self.members
    }

    /// Returns whether `user_id` is a member.
    #[must_use]
    pub fn is_member(&self, user_id: UserId) -> bool {
        self.members.contains(&user_id)
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Updates descriptive fields. The creator never changes.
    pub fn update_details(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        status: ProjectStatus,
    ) -> AppResult<()> {
        self.name = validate_project_name(name.into())?;
        self.description = description.into();
        self.status = status;
        self.touch();
        Ok(())
    }

    /// Adds a member. Returns `false` when already present.
    pub fn add_member(&mut self, user_id: UserId) -> bool {
        let inserted = self.members.insert(user_id);
        if inserted {
            self.touch();
        }
        inserted
    }

    /// Removes a member. The creator cannot be removed.
    pub fn remove_member(&mut self, user_id: UserId) -> AppResult<bool> {
        if user_id == self.creator {
            return Err(AppError::Conflict(format!(
                "user '{user_id}' created project '{}' and cannot be removed from it",
                self.id
            )));
        }

        let removed = self.members.remove(&user_id);
        if removed {
            self.touch();
        }
        Ok(removed)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn validate_project_name(name: String) -> AppResult<NonEmptyString> {
    if name.chars().count() > PROJECT_NAME_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "project name must not exceed {PROJECT_NAME_MAX_LENGTH} characters"
        )));
    }

    NonEmptyString::new(name.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creator_is_added_to_members() -> AppResult<()> {
        let creator = UserId::new();
        let project = Project::create(creator, "Apollo", "", ProjectStatus::Active, [])?;
        assert_eq!(project.creator(), creator);
        assert!(project.is_member(creator));
        Ok(())
    }

    #[test]
    fn creator_cannot_be_removed() -> AppResult<()> {
        let creator = UserId::new();
        let mut project = Project::create(creator, "Apollo", "", ProjectStatus::Active, [])?;
        assert!(project.remove_member(creator).is_err());
        assert!(project.is_member(creator));
        Ok(())
    }

    #[test]
    fn members_can_be_added_and_removed() -> AppResult<()> {
        let mut project =
            Project::create(UserId::new(), "Apollo", "", ProjectStatus::Active, [])?;
        let member = UserId::new();
        assert!(project.add_member(member));
        assert!(!project.add_member(member));
        assert!(project.remove_member(member)?);
        assert!(!project.is_member(member));
        Ok(())
    }

    #[test]
    fn blank_or_oversized_names_are_rejected() {
        let creator = UserId::new();
        assert!(Project::create(creator, "   ", "", ProjectStatus::Active, []).is_err());
        let long_name = "x".repeat(PROJECT_NAME_MAX_LENGTH + 1);
        assert!(Project::create(creator, long_name, "", ProjectStatus::Active, []).is_err());
    }

    #[test]
    fn status_parses_storage_values() {
        assert!(matches!(
            ProjectStatus::from_str("on_hold"),
            Ok(ProjectStatus::OnHold)
        ));
        assert!(ProjectStatus::from_str("paused").is_err());
    }
}
