mod cors;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use taskhub_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::state::AppState;
use crate::{auth, handlers, middleware};

use self::cors::build_cors_layer;

/// Headroom for multipart framing on top of the upload limit.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

pub fn build_router(
    app_state: AppState,
    session_layer: SessionManagerLayer<MemoryStore>,
) -> Result<Router, AppError> {
    let upload_body_limit = usize::try_from(
        app_state
            .max_upload_bytes
            .saturating_add(MULTIPART_OVERHEAD_BYTES),
    )
    .unwrap_or(usize::MAX);

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/api/profile/password", put(auth::change_password_handler))
        .route(
            "/api/projects",
            get(handlers::projects::list_projects_handler)
                .post(handlers::projects::create_project_handler),
        )
        .route(
            "/api/projects/{project_id}",
            get(handlers::projects::get_project_handler)
                .put(handlers::projects::update_project_handler)
                .delete(handlers::projects::delete_project_handler),
        )
        .route(
            "/api/projects/{project_id}/members",
            post(handlers::projects::add_member_handler),
        )
        .route(
            "/api/projects/{project_id}/members/{user_id}",
            delete(handlers::projects::remove_member_handler),
        )
        .route(
            "/api/tasks",
            get(handlers::tasks::list_tasks_handler).post(handlers::tasks::create_task_handler),
        )
        .route(
            "/api/tasks/weekly-report",
            get(handlers::tasks::weekly_report_handler),
        )
        .route(
            "/api/tasks/{task_id}",
            get(handlers::tasks::get_task_handler)
                .put(handlers::tasks::update_task_handler)
                .delete(handlers::tasks::delete_task_handler),
        )
        .route(
            "/api/files",
            get(handlers::files::list_files_handler).post(handlers::files::upload_file_handler),
        )
        .route(
            "/api/files/stats",
            get(handlers::files::storage_stats_handler),
        )
        .route(
            "/api/files/{file_id}",
            get(handlers::files::get_file_handler)
                .put(handlers::files::update_file_handler)
                .delete(handlers::files::delete_file_handler),
        )
        .route(
            "/api/files/{file_id}/download",
            get(handlers::files::download_file_handler),
        )
        .route("/api/users", get(handlers::users::list_users_handler))
        .route(
            "/api/users/{user_id}",
            get(handlers::users::get_user_handler)
                .put(handlers::users::update_user_handler)
                .delete(handlers::users::delete_user_handler),
        )
        .route(
            "/api/users/{user_id}/role",
            put(handlers::users::change_role_handler),
        )
        .layer(DefaultBodyLimit::max(upload_body_limit))
        .route_layer(from_fn_with_state(app_state.clone(), middleware::require_auth));

    let cors_layer = build_cors_layer(&app_state.frontend_url)?;

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
