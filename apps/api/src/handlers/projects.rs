use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use taskhub_application::CreateProjectInput;
use taskhub_core::{ProjectId, UserId};
use taskhub_domain::Actor;
use tracing::warn;

use crate::dto::{
    AddMemberRequest, CreateProjectRequest, ProjectDetailResponse, ProjectResponse,
    UpdateProjectRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

/// Logs a client-supplied creator that does not match the caller.
fn ignore_forged_creator(actor: &Actor, creator: Option<UserId>) {
    if let Some(creator) = creator
        && !actor.is(creator)
    {
        warn!(
            actor = ?actor.user_id(),
            claimed_creator = %creator,
            "ignoring client-supplied project creator"
        );
    }
}

pub async fn list_projects_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let projects = state
        .project_service
        .list_projects(&actor)
        .await?
        .into_iter()
        .map(ProjectResponse::from)
        .collect();

    Ok(Json(projects))
}

pub async fn create_project_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    ignore_forged_creator(&actor, payload.creator);

    let project = state
        .project_service
        .create_project(
            &actor,
            CreateProjectInput {
                name: payload.name,
                description: payload.description,
                status: payload.status,
                members: payload.members,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ProjectResponse::from(project))))
}

pub async fn get_project_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(project_id): Path<ProjectId>,
) -> ApiResult<Json<ProjectDetailResponse>> {
    let details = state
        .project_service
        .get_project(&actor, project_id)
        .await?;
    Ok(Json(ProjectDetailResponse::from(details)))
}

pub async fn update_project_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    ignore_forged_creator(&actor, payload.creator);

    let project = state
        .project_service
        .update_project(&actor, project_id, payload.into())
        .await?;
    Ok(Json(ProjectResponse::from(project)))
}

pub async fn delete_project_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(project_id): Path<ProjectId>,
) -> ApiResult<StatusCode> {
    state
        .project_service
        .delete_project(&actor, project_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_member_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<AddMemberRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    let project = state
        .project_service
        .add_member(&actor, project_id, payload.user_id)
        .await?;
    Ok(Json(ProjectResponse::from(project)))
}

pub async fn remove_member_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((project_id, user_id)): Path<(ProjectId, UserId)>,
) -> ApiResult<Json<ProjectResponse>> {
    let project = state
        .project_service
        .remove_member(&actor, project_id, user_id)
        .await?;
    Ok(Json(ProjectResponse::from(project)))
}
