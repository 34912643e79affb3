use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use taskhub_application::{CreateTaskInput, UpdateTaskInput};
use taskhub_core::TaskId;
use taskhub_domain::Actor;
use tracing::warn;

use crate::dto::{
    CreateTaskRequest, TaskListParams, TaskResponse, UpdateTaskRequest, WeeklyReportResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_tasks_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<TaskListParams>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let tasks = state
        .task_service
        .list_tasks(&actor, params.into())
        .await?
        .into_iter()
        .map(TaskResponse::from)
        .collect();

    Ok(Json(tasks))
}

pub async fn create_task_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    if let Some(creator) = payload.creator
        && !actor.is(creator)
    {
        warn!(
            actor = ?actor.user_id(),
            claimed_creator = %creator,
            "ignoring client-supplied task creator"
        );
    }

    let task = state
        .task_service
        .create_task(
            &actor,
            CreateTaskInput {
                project_id: payload.project_id,
                details: payload.details(),
                assignee: payload.assignee,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

pub async fn get_task_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(task_id): Path<TaskId>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state.task_service.get_task(&actor, task_id).await?;
    Ok(Json(TaskResponse::from(task)))
}

pub async fn update_task_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(task_id): Path<TaskId>,
    Json(payload): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state
        .task_service
        .update_task(
            &actor,
            task_id,
            UpdateTaskInput {
                details: payload.details(),
                assignee: payload.assignee,
            },
        )
        .await?;
    Ok(Json(TaskResponse::from(task)))
}

pub async fn delete_task_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(task_id): Path<TaskId>,
) -> ApiResult<StatusCode> {
    state.task_service.delete_task(&actor, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn weekly_report_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<WeeklyReportResponse>> {
    let report = state.report_service.current_report(&actor).await?;
    Ok(Json(WeeklyReportResponse::from(report)))
}
