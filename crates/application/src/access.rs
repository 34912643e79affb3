//! Translation of policy decisions into application errors.
//!
//! Object-level checks run the visibility filter before the gate, so a
//! resource the actor cannot see is reported as missing rather than
//! forbidden.

use std::fmt::Display;

use taskhub_core::{AppError, AppResult};
use taskhub_domain::{
    AccessPolicy, Actor, Decision, FileAttachment, FileScope, Operation, Project, Resource,
    ResourceKind, Task, TaskScope,
};
use tracing::debug;

/// Fails with `Unauthorized` for anonymous actors.
pub(crate) fn require_authenticated(actor: &Actor) -> AppResult<()> {
    if actor.is_authenticated() {
        return Ok(());
    }

    Err(AppError::Unauthorized("authentication required".to_owned()))
}

/// Converts a gate decision into a result.
pub(crate) fn require_decision(
    decision: Decision,
    actor: &Actor,
    operation: Operation,
    kind: ResourceKind,
) -> AppResult<()> {
    if decision.is_allowed() {
        return Ok(());
    }

    debug!(
        user_id = ?actor.user_id(),
        role = ?actor.role(),
        operation = operation.as_str(),
        kind = kind.as_str(),
        "access denied"
    );

    match actor.identity() {
        None => Err(AppError::Unauthorized("authentication required".to_owned())),
        Some(identity) => Err(AppError::Forbidden(format!(
            "user '{}' may not {} {}",
            identity.username(),
            operation.as_str(),
            kind.as_str()
        ))),
    }
}

/// Authorizes a collection-level operation (`list` or `create`).
pub(crate) fn require_collection(
    policy: &AccessPolicy,
    actor: &Actor,
    operation: Operation,
    kind: ResourceKind,
) -> AppResult<()> {
    require_authenticated(actor)?;
    require_decision(
        policy.authorize(actor, operation, kind, None),
        actor,
        operation,
        kind,
    )
}

/// Authorizes an operation on one loaded resource: authentication, then
/// visibility, then the gate.
pub(crate) fn require_object(
    policy: &AccessPolicy,
    actor: &Actor,
    operation: Operation,
    resource: Resource<'_>,
    id: impl Display,
) -> AppResult<()> {
    require_authenticated(actor)?;

    let kind = resource.kind();
    if !policy.visible_set(actor, kind).admits(resource) {
        debug!(
            user_id = ?actor.user_id(),
            kind = kind.as_str(),
            "resource outside visibility filter"
        );
        return Err(not_found(kind, id));
    }

    require_decision(
        policy.authorize(actor, operation, kind, Some(resource)),
        actor,
        operation,
        kind,
    )
}

/// Builds the uniform missing-resource error.
pub(crate) fn not_found(kind: ResourceKind, id: impl Display) -> AppError {
    AppError::NotFound(format!("{} '{id}' does not exist", kind.as_str()))
}

/// A task loaded with its project.
#[derive(Debug, Clone)]
pub(crate) struct LoadedTask {
    pub(crate) task: Task,
    pub(crate) project: Project,
}

impl LoadedTask {
    pub(crate) fn scope(&self) -> TaskScope<'_> {
        TaskScope::new(&self.task, &self.project)
    }
}

/// A file loaded with whichever relation it is attached to.
#[derive(Debug, Clone)]
pub(crate) struct LoadedFile {
    pub(crate) file: FileAttachment,
    pub(crate) project: Option<Project>,
    pub(crate) task: Option<LoadedTask>,
}

impl LoadedFile {
    pub(crate) fn scope(&self) -> FileScope<'_> {
        let mut scope = FileScope::new(&self.file);
        if let Some(project) = &self.project {
            scope = scope.with_project(project);
        }
        if let Some(task) = &self.task {
            scope = scope.with_task(task.scope());
        }
        scope
    }
}
