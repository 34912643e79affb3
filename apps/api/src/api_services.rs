//! Wiring of adapters into application services.

use std::sync::Arc;

use taskhub_application::{
    FileService, OverdueTaskService, ProjectService, TaskService, UserService, WeeklyReportService,
};
use taskhub_domain::AccessPolicy;
use taskhub_infrastructure::{
    Argon2PasswordHasher, InMemoryStore, LocalFileStorage, LogNotificationDispatcher,
};
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::api_config::ApiConfig;
use crate::state::AppState;

/// Services plus the background jobs that share their store.
pub struct ApiServices {
    pub state: AppState,
    pub overdue_scanner: OverdueTaskService,
    pub report_service: WeeklyReportService,
}

pub fn build_services(config: &ApiConfig) -> ApiServices {
    let store = Arc::new(InMemoryStore::new());
    let storage = Arc::new(LocalFileStorage::new(config.upload_dir.clone()));
    let dispatcher = Arc::new(LogNotificationDispatcher::new());
    let hasher = Arc::new(Argon2PasswordHasher::new());
    let policy = AccessPolicy::new(config.project_write_policy);
    let report_service = WeeklyReportService::new(store.clone(), dispatcher.clone());

    let state = AppState {
        user_service: UserService::new(store.clone(), hasher, storage.clone(), policy),
        project_service: ProjectService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            storage.clone(),
            policy,
        ),
        task_service: TaskService::new(
            store.clone(),
            store.clone(),
            storage.clone(),
            dispatcher.clone(),
            policy,
        ),
        file_service: FileService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            storage,
            policy,
            config.max_upload_bytes,
        ),
        report_service: report_service.clone(),
        frontend_url: config.frontend_url.clone(),
        max_upload_bytes: config.max_upload_bytes,
    };

    ApiServices {
        state,
        overdue_scanner: OverdueTaskService::new(store, dispatcher),
        report_service,
    }
}

pub fn build_session_layer(config: &ApiConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(
            config.session_idle_minutes,
        )))
}
