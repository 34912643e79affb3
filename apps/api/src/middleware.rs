use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use taskhub_core::{AppError, UserIdentity};
use tower_sessions::Session;
use tracing::debug;

use crate::auth::SESSION_USER_KEY;
use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the session identity into a fresh `Actor` and stores it in the
/// request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let actor = state.user_service.resolve_actor(&identity).await?;
    if !actor.is_authenticated() {
        debug!(user_id = %identity.user_id(), "session refers to a deleted account");
        session
            .flush()
            .await
            .map_err(|error| AppError::Internal(format!("failed to flush session: {error}")))?;
        return Err(AppError::Unauthorized("authentication required".to_owned()).into());
    }

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        check_same_origin(request.headers(), &state.frontend_url)?;
    }

    Ok(next.run(request).await)
}

fn check_same_origin(headers: &HeaderMap, allowed_origin: &str) -> Result<(), AppError> {
    if headers.get("sec-fetch-site") == Some(&HeaderValue::from_static("cross-site")) {
        return Err(AppError::Forbidden("cross-site request blocked".to_owned()));
    }

    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let origin_is_allowed = origin == allowed_origin;
    let referer_is_allowed = referer == allowed_origin
        || referer
            .strip_prefix(allowed_origin)
            .is_some_and(|rest| rest.starts_with('/'));

    if origin_is_allowed || referer_is_allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden("origin validation failed".to_owned()))
    }
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
