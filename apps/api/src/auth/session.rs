use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use taskhub_core::{AppError, UserIdentity};
use taskhub_domain::Actor;
use tower_sessions::Session;
use tracing::info;

use crate::dto::UserResponse;
use crate::error::ApiResult;
use crate::state::AppState;

use super::SESSION_USER_KEY;

/// POST /auth/logout - Drop the session.
pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    let user_id = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .map(|identity| identity.user_id());

    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    if let Some(user_id) = user_id {
        info!(user_id = %user_id, "user logged out");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me - Return the caller's current account.
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<UserResponse>> {
    let account = state.user_service.current_account(&actor).await?;
    Ok(Json(UserResponse::from(account)))
}
