//! Access policy engine.
//!
//! Two pure entry points drive every access decision in Taskhub:
//!
//! - [`AccessPolicy::authorize`] answers whether an actor may perform one
//!   operation on one resource kind (and, for object-level operations, one
//!   concrete resource).
//! - [`AccessPolicy::visible_set`] returns the declarative row filter that
//!   restricts which resources an actor may enumerate.
//!
//! Object-level reads and writes apply the visibility filter first and the
//! gate second. Neither function performs I/O, holds state or fails: any
//! combination that no rule matches is [`Decision::Deny`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use taskhub_core::{AppError, Role, UserId, UserIdentity};

use crate::{FileAttachment, Project, Task, UserAccount};

mod rules;
mod visibility;


pub use visibility::{Visibility, VisibilityClause};

/// The party attempting an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// Request without a valid session.
    Anonymous,
    /// Authenticated user with a role snapshot.
    Authenticated(UserIdentity),
}

impl Actor {
    /// Builds an actor from an optional session identity.
    #[must_use]
    pub fn from_identity(identity: Option<UserIdentity>) -> Self {
        identity.map_or(Self::Anonymous, Self::Authenticated)
    }

    /// Returns the identity for authenticated actors.
    #[must_use]
    pub fn identity(&self) -> Option<&UserIdentity> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(identity) => Some(identity),
        }
    }

    /// Returns the user id for authenticated actors.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.identity().map(UserIdentity::user_id)
    }

    /// Returns the role for authenticated actors.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.identity().map(UserIdentity::role)
    }

    /// Returns whether the actor is authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Returns whether the actor is authenticated as `user_id`.
    #[must_use]
    pub fn is(&self, user_id: UserId) -> bool {
        self.user_id() == Some(user_id)
    }

    /// Returns whether the actor holds at least `role`.
    #[must_use]
    pub fn has_role_at_least(&self, role: Role) -> bool {
        self.role().is_some_and(|actor_role| actor_role.at_least(role))
    }

    /// Returns whether the actor is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }
}

/// Operation requested on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Enumerate a collection.
    List,
    /// Read one resource.
    Retrieve,
    /// Create a resource.
    Create,
    /// Modify one resource.
    Update,
    /// Remove one resource.
    Delete,
    /// Fetch file content.
    Download,
}

impl Operation {
    /// Returns a stable value for logs and error messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Retrieve => "retrieve",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Download => "download",
        }
    }

    /// Returns all operations.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Operation] = &[
            Operation::List,
            Operation::Retrieve,
            Operation::Create,
            Operation::Update,
            Operation::Delete,
            Operation::Download,
        ];

        ALL
    }
}

/// Kind of resource subject to access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Projects.
    Project,
    /// Tasks.
    Task,
    /// File attachments.
    File,
    /// User accounts.
    User,
}

impl ResourceKind {
    /// Returns a stable value for logs and error messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Task => "task",
            Self::File => "file",
            Self::User => "user",
        }
    }

    /// Returns all resource kinds.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ResourceKind] = &[
            ResourceKind::Project,
            ResourceKind::Task,
            ResourceKind::File,
            ResourceKind::User,
        ];

        ALL
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// The operation may proceed.
    Allow,
    /// The operation must be rejected.
    Deny,
}

impl Decision {
    /// Returns whether the decision allows the operation.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl From<bool> for Decision {
    fn from(value: bool) -> Self {
        if value { Self::Allow } else { Self::Deny }
    }
}

/// A task together with its owning project.
#[derive(Debug, Clone, Copy)]
pub struct TaskScope<'a> {
    /// The task.
    pub task: &'a Task,
    /// The project the task belongs to.
    pub project: &'a Project,
}

impl<'a> TaskScope<'a> {
    /// Pairs a task with its project.
    #[must_use]
    pub fn new(task: &'a Task, project: &'a Project) -> Self {
        Self { task, project }
    }

    /// Returns the project only when it really owns the task.
    #[must_use]
    pub(crate) fn owning_project(&self) -> Option<&'a Project> {
        (self.task.project_id() == self.project.id()).then_some(self.project)
    }
}

/// A file together with whichever relation it is attached to.
#[derive(Debug, Clone, Copy)]
pub struct FileScope<'a> {
    /// The file metadata.
    pub file: &'a FileAttachment,
    /// The attached project, when `file.project()` is set.
    pub project: Option<&'a Project>,
    /// The attached task and its project, when `file.task()` is set.
    pub task: Option<TaskScope<'a>>,
}

impl<'a> FileScope<'a> {
    /// Wraps a file with no loaded relations.
    #[must_use]
    pub fn new(file: &'a FileAttachment) -> Self {
        Self {
            file,
            project: None,
            task: None,
        }
    }

    /// Attaches the loaded project relation.
    #[must_use]
    pub fn with_project(mut self, project: &'a Project) -> Self {
        self.project = Some(project);
        self
    }

    /// Attaches the loaded task relation.
    #[must_use]
    pub fn with_task(mut self, task: TaskScope<'a>) -> Self {
        self.task = Some(task);
        self
    }

    /// Returns the project only when it matches the file's project reference.
    #[must_use]
    pub(crate) fn attached_project(&self) -> Option<&'a Project> {
        let project = self.project?;
        (self.file.project() == Some(project.id())).then_some(project)
    }

    /// Returns the task only when it matches the file's task reference.
    #[must_use]
    pub(crate) fn attached_task(&self) -> Option<TaskScope<'a>> {
        let task = self.task?;
        (self.file.task() == Some(task.task.id())).then_some(task)
    }
}

/// A concrete resource handed to an object-level check.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    /// A project. Also used as the parent scope of a task `create`.
    Project(&'a Project),
    /// A task with its project.
    Task(TaskScope<'a>),
    /// A file with its relations.
    File(FileScope<'a>),
    /// A user account.
    User(&'a UserAccount),
}

impl Resource<'_> {
    /// Returns the kind of the wrapped resource.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Project(_) => ResourceKind::Project,
            Self::Task(_) => ResourceKind::Task,
            Self::File(_) => ResourceKind::File,
            Self::User(_) => ResourceKind::User,
        }
    }
}

/// Who may update or delete a project besides administrators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectWritePolicy {
    /// Creator and any member.
    #[default]
    Permissive,
    /// Creator only.
    CreatorOnly,
}

impl ProjectWritePolicy {
    /// Returns a stable configuration value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permissive => "permissive",
            Self::CreatorOnly => "creator_only",
        }
    }
}

impl FromStr for ProjectWritePolicy {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "permissive" => Ok(Self::Permissive),
            "creator_only" => Ok(Self::CreatorOnly),
            _ => Err(AppError::Validation(format!(
                "unknown project write policy '{value}'"
            ))),
        }
    }
}

/// Ordered decision table for every resource kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    project_writes: ProjectWritePolicy,
}

impl AccessPolicy {
    /// Creates a policy with the given project write variant.
    #[must_use]
    pub fn new(project_writes: ProjectWritePolicy) -> Self {
        Self { project_writes }
    }

    /// Returns the configured project write variant.
    #[must_use]
    pub fn project_writes(&self) -> ProjectWritePolicy {
        self.project_writes
    }

    /// Decides whether `actor` may perform `operation` on `kind`.
    ///
    /// `resource` is the concrete target for object-level operations
    /// (retrieve, update, delete, download) and is absent for `list`. For a
    /// task `create` it may carry the target project as
    /// [`Resource::Project`]. A resource whose kind does not fit the request
    /// is denied.
    #[must_use]
    pub fn authorize(
        &self,
        actor: &Actor,
        operation: Operation,
        kind: ResourceKind,
        resource: Option<Resource<'_>>,
    ) -> Decision {
        if !actor.is_authenticated() {
            return Decision::Deny;
        }

        if actor.is_admin() {
            return Decision::Allow;
        }

        match kind {
            ResourceKind::Project => {
                rules::project(actor, operation, resource, self.project_writes)
            }
            ResourceKind::Task => rules::task(actor, operation, resource),
            ResourceKind::File => rules::file(actor, operation, resource),
            ResourceKind::User => rules::user(actor, operation, resource),
        }
    }

    /// Returns the row filter for `kind` as seen by `actor`.
    #[must_use]
    pub fn visible_set(&self, actor: &Actor, kind: ResourceKind) -> Visibility {
        visibility::visible_set(actor, kind)
    }

    /// Decides whether `actor` may add or remove members of `project`.
    #[must_use]
    pub fn authorize_membership_change(&self, actor: &Actor, project: &Project) -> Decision {
        Decision::from(actor.is_admin() || actor.is(project.creator()))
    }

    /// Decides whether `actor` may set `target`'s role.
    ///
    /// Only administrators change roles and nobody changes their own.
    #[must_use]
    pub fn authorize_role_change(&self, actor: &Actor, target: &UserAccount) -> Decision {
        Decision::from(actor.is_admin() && !actor.is(target.id()))
    }
}

/// Authorizes with the default (permissive) policy.
#[must_use]
pub fn authorize(
    actor: &Actor,
    operation: Operation,
    kind: ResourceKind,
    resource: Option<Resource<'_>>,
) -> Decision {
    AccessPolicy::default().authorize(actor, operation, kind, resource)
}

/// Computes a visibility filter with the default policy.
#[must_use]
pub fn visible_set(actor: &Actor, kind: ResourceKind) -> Visibility {
    AccessPolicy::default().visible_set(actor, kind)
}
