use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use taskhub_application::{LoginOutcome, RegisterUserInput};
use taskhub_core::AppError;
use taskhub_domain::{Actor, UserProfile};
use tower_sessions::Session;
use tracing::info;

use crate::dto::{ChangePasswordRequest, LoginRequest, RegisterRequest, UserResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::SESSION_USER_KEY;

/// POST /auth/register - Create an employee account.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let account = state
        .user_service
        .register(RegisterUserInput {
            username: payload.username,
            password: payload.password,
            email: payload.email,
            profile: UserProfile {
                first_name: payload.first_name,
                last_name: payload.last_name,
                ..UserProfile::default()
            },
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(account))))
}

/// POST /auth/login - Authenticate and start a session.
pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserResponse>> {
    let account = match state
        .user_service
        .login(&payload.username, &payload.password)
        .await?
    {
        LoginOutcome::Authenticated(account) => account,
        LoginOutcome::Failed => {
            return Err(AppError::Unauthorized("invalid username or password".to_owned()).into());
        }
    };

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;
    session
        .insert(SESSION_USER_KEY, account.identity())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    info!(user_id = %account.id(), "user logged in");
    Ok(Json(UserResponse::from(account)))
}

/// PUT /api/profile/password - Change the caller's password.
pub async fn change_password_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    state
        .user_service
        .change_password(&actor, &payload.current_password, &payload.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
