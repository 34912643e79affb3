use serde::{Deserialize, Serialize};
use taskhub_core::{Role, UserId};

use super::{Actor, FileScope, Resource, ResourceKind, TaskScope};
use crate::{Project, UserAccount};

/// Declarative row filter produced by [`super::AccessPolicy::visible_set`].
///
/// Repositories translate it into their own query language; the in-memory
/// adapters evaluate it with the `admits_*` helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "clauses", rename_all = "snake_case")]
pub enum Visibility {
    /// Every row.
    Everything,
    /// No row.
    Nothing,
    /// Rows matching at least one clause.
    AnyOf(Vec<VisibilityClause>),
}

/// One disjunct of a visibility filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "clause", content = "user_id", rename_all = "snake_case")]
pub enum VisibilityClause {
    /// Project created by the user.
    ProjectCreator(UserId),
    /// Project with the user as member.
    ProjectMember(UserId),
    /// Task assigned to the user.
    TaskAssignee(UserId),
    /// Task whose project was created by the user.
    TaskProjectCreator(UserId),
    /// Task whose project has the user as member.
    TaskProjectMember(UserId),
    /// Public file.
    FilePublic,
    /// File uploaded by the user.
    FileUploadedBy(UserId),
    /// Personal file of the user.
    FileOwner(UserId),
    /// File attached to a project with the user as member.
    FileProjectMember(UserId),
    /// File attached to a task assigned to the user.
    FileTaskAssignee(UserId),
    /// File attached to a task created by the user.
    FileTaskCreator(UserId),
    /// File attached to a task whose project has the user as member.
    FileTaskProjectMember(UserId),
    /// The user's own account.
    UserSelf(UserId),
}

impl VisibilityClause {
    fn admits_project(&self, project: &Project) -> bool {
        match *self {
            Self::ProjectCreator(user_id) => project.creator() == user_id,
            Self::ProjectMember(user_id) => project.is_member(user_id),
            _ => false,
        }
    }

    fn admits_task(&self, scope: TaskScope<'_>) -> bool {
        match *self {
            Self::TaskAssignee(user_id) => scope.task.assignee() == Some(user_id),
            Self::TaskProjectCreator(user_id) => scope
                .owning_project()
                .is_some_and(|project| project.creator() == user_id),
            Self::TaskProjectMember(user_id) => scope
                .owning_project()
                .is_some_and(|project| project.is_member(user_id)),
            _ => false,
        }
    }

    fn admits_file(&self, scope: FileScope<'_>) -> bool {
        let file = scope.file;
        match *self {
            Self::FilePublic => file.is_public(),
            Self::FileUploadedBy(user_id) => file.uploaded_by() == user_id,
            Self::FileOwner(user_id) => file.user() == Some(user_id),
            Self::FileProjectMember(user_id) => scope
                .attached_project()
                .is_some_and(|project| project.is_member(user_id)),
            Self::FileTaskAssignee(user_id) => scope
                .attached_task()
                .is_some_and(|task| task.task.assignee() == Some(user_id)),
            Self::FileTaskCreator(user_id) => scope
                .attached_task()
                .is_some_and(|task| task.task.creator() == user_id),
            Self::FileTaskProjectMember(user_id) => scope.attached_task().is_some_and(|task| {
                task.owning_project()
                    .is_some_and(|project| project.is_member(user_id))
            }),
            _ => false,
        }
    }

    fn admits_user(&self, account: &UserAccount) -> bool {
        match *self {
            Self::UserSelf(user_id) => account.id() == user_id,
            _ => false,
        }
    }
}

impl Visibility {
    /// Returns whether the filter admits nothing.
    #[must_use]
    pub fn is_nothing(&self) -> bool {
        match self {
            Self::Nothing => true,
            Self::AnyOf(clauses) => clauses.is_empty(),
            Self::Everything => false,
        }
    }

    /// Returns whether `resource` passes the filter.
    #[must_use]
    pub fn admits(&self, resource: Resource<'_>) -> bool {
        match resource {
            Resource::Project(project) => self.admits_project(project),
            Resource::Task(scope) => self.admits_task(scope),
            Resource::File(scope) => self.admits_file(scope),
            Resource::User(account) => self.admits_user(account),
        }
    }

    /// Returns whether `project` passes the filter.
    #[must_use]
    pub fn admits_project(&self, project: &Project) -> bool {
        self.any(|clause| clause.admits_project(project))
    }

    /// Returns whether the task in `scope` passes the filter.
    #[must_use]
    pub fn admits_task(&self, scope: TaskScope<'_>) -> bool {
        self.any(|clause| clause.admits_task(scope))
    }

    /// Returns whether the file in `scope` passes the filter.
    #[must_use]
    pub fn admits_file(&self, scope: FileScope<'_>) -> bool {
        self.any(|clause| clause.admits_file(scope))
    }

    /// Returns whether `account` passes the filter.
    #[must_use]
    pub fn admits_user(&self, account: &UserAccount) -> bool {
        self.any(|clause| clause.admits_user(account))
    }

    fn any(&self, predicate: impl Fn(&VisibilityClause) -> bool) -> bool {
        match self {
            Self::Everything => true,
            Self::Nothing => false,
            Self::AnyOf(clauses) => clauses.iter().any(predicate),
        }
    }
}

pub(super) fn visible_set(actor: &Actor, kind: ResourceKind) -> Visibility {
    let Some(identity) = actor.identity() else {
        return Visibility::Nothing;
    };
    let user_id = identity.user_id();

    let clauses = match (identity.role(), kind) {
        (Role::Admin, _) => return Visibility::Everything,
        (Role::Manager, ResourceKind::Project) => vec![
            VisibilityClause::ProjectCreator(user_id),
            VisibilityClause::ProjectMember(user_id),
        ],
        (Role::Employee, ResourceKind::Project) => vec![VisibilityClause::ProjectMember(user_id)],
        (Role::Manager, ResourceKind::Task) => vec![
            VisibilityClause::TaskProjectCreator(user_id),
            VisibilityClause::TaskProjectMember(user_id),
        ],
        (Role::Employee, ResourceKind::Task) => vec![VisibilityClause::TaskAssignee(user_id)],
        (_, ResourceKind::File) => vec![
            VisibilityClause::FilePublic,
            VisibilityClause::FileUploadedBy(user_id),
            VisibilityClause::FileOwner(user_id),
            VisibilityClause::FileProjectMember(user_id),
            VisibilityClause::FileTaskAssignee(user_id),
            VisibilityClause::FileTaskCreator(user_id),
            VisibilityClause::FileTaskProjectMember(user_id),
        ],
        (_, ResourceKind::User) => vec![VisibilityClause::UserSelf(user_id)],
    };

    Visibility::AnyOf(clauses)
}
