use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use taskhub_core::UserId;
use taskhub_domain::Actor;

use crate::dto::{ChangeRoleRequest, UpdateUserRequest, UserResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state
        .user_service
        .list_users(&actor)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<UserResponse>> {
    let account = state.user_service.get_user(&actor, user_id).await?;
    Ok(Json(UserResponse::from(account)))
}

pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<UserId>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let account = state
        .user_service
        .update_user(&actor, user_id, payload.into())
        .await?;
    Ok(Json(UserResponse::from(account)))
}

pub async fn change_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<UserId>,
    Json(payload): Json<ChangeRoleRequest>,
) -> ApiResult<Json<UserResponse>> {
    let account = state
        .user_service
        .change_role(&actor, user_id, payload.role)
        .await?;
    Ok(Json(UserResponse::from(account)))
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<UserId>,
) -> ApiResult<StatusCode> {
    state.user_service.delete_user(&actor, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
