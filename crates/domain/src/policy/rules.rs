//! Per-kind decision rules for authenticated, non-admin actors.
//!
//! Each function is one ordered table; the first matching arm wins and the
//! trailing arm denies.

use taskhub_core::Role;

use super::{Actor, Decision, FileScope, Operation, ProjectWritePolicy, Resource, TaskScope};

pub(super) fn project(
    actor: &Actor,
    operation: Operation,
    resource: Option<Resource<'_>>,
    writes: ProjectWritePolicy,
) -> Decision {
    match (operation, resource) {
        (Operation::List, None) => Decision::Allow,
        (Operation::Retrieve, Some(Resource::Project(_))) => Decision::Allow,
        (Operation::Create, None) => Decision::from(actor.has_role_at_least(Role::Manager)),
        (Operation::Update | Operation::Delete, Some(Resource::Project(project))) => {
            let is_creator = actor.is(project.creator());
            let is_member = actor.user_id().is_some_and(|id| project.is_member(id));
            match writes {
                ProjectWritePolicy::Permissive => Decision::from(is_creator || is_member),
                ProjectWritePolicy::CreatorOnly => Decision::from(is_creator),
            }
        }
        _ => Decision::Deny,
    }
}

pub(super) fn task(
    actor: &Actor,
    operation: Operation,
    resource: Option<Resource<'_>>,
) -> Decision {
    match (operation, resource) {
        (Operation::List, None) => Decision::Allow,
        (Operation::Retrieve, Some(Resource::Task(_))) => Decision::Allow,
        (Operation::Create, None) => Decision::from(actor.has_role_at_least(Role::Manager)),
        (Operation::Create, Some(Resource::Project(project))) => Decision::from(
            actor.has_role_at_least(Role::Manager)
                && actor.user_id().is_some_and(|id| project.is_member(id)),
        ),
        (Operation::Update | Operation::Delete, Some(Resource::Task(scope))) => {
            task_write(actor, scope)
        }
        _ => Decision::Deny,
    }
}

fn task_write(actor: &Actor, scope: TaskScope<'_>) -> Decision {
    let is_assignee = scope
        .task
        .assignee()
        .is_some_and(|assignee| actor.is(assignee));
    let is_project_creator = scope
        .owning_project()
        .is_some_and(|project| actor.is(project.creator()));

    Decision::from(is_assignee || is_project_creator)
}

pub(super) fn file(
    actor: &Actor,
    operation: Operation,
    resource: Option<Resource<'_>>,
) -> Decision {
    match (operation, resource) {
        (Operation::List | Operation::Create, None) => Decision::Allow,
        (Operation::Retrieve | Operation::Download, Some(Resource::File(scope))) => {
            file_read(actor, scope)
        }
        (Operation::Update, Some(Resource::File(scope))) => Decision::from(
            actor.has_role_at_least(Role::Manager) || actor.is(scope.file.uploaded_by()),
        ),
        (Operation::Delete, Some(Resource::File(_))) => {
            Decision::from(actor.has_role_at_least(Role::Manager))
        }
        _ => Decision::Deny,
    }
}

fn file_read(actor: &Actor, scope: FileScope<'_>) -> Decision {
    let Some(user_id) = actor.user_id() else {
        return Decision::Deny;
    };
    let file = scope.file;

    if file.is_public() || file.uploaded_by() == user_id || file.user() == Some(user_id) {
        return Decision::Allow;
    }

    if scope
        .attached_project()
        .is_some_and(|project| project.is_member(user_id))
    {
        return Decision::Allow;
    }

    let task_grants = scope.attached_task().is_some_and(|task_scope| {
        task_scope.task.assignee() == Some(user_id)
            || task_scope.task.creator() == user_id
            || task_scope
                .owning_project()
                .is_some_and(|project| project.is_member(user_id))
    });

    Decision::from(task_grants)
}

pub(super) fn user(
    _actor: &Actor,
    operation: Operation,
    resource: Option<Resource<'_>>,
) -> Decision {
    match (operation, resource) {
        (Operation::List, None) => Decision::Allow,
        _ => Decision::Deny,
    }
}
