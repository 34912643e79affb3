//! Taskhub API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::time::Duration;

use chrono::Utc;
use taskhub_application::{OverdueTaskService, WeeklyReportService};
use taskhub_core::AppError;
use tracing::{error, info};

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_services::{ApiServices, build_services, build_session_layer};

const OVERDUE_SCAN_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
const WEEKLY_REPORT_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let ApiServices {
        state,
        overdue_scanner,
        report_service,
    } = build_services(&config);

    if let Some(admin) = &config.bootstrap_admin {
        let account = state
            .user_service
            .bootstrap_admin(&admin.username, &admin.password)
            .await?;
        info!(user_id = %account.id(), username = %admin.username, "bootstrap admin ready");
    }

    tokio::spawn(run_overdue_scans(overdue_scanner));
    tokio::spawn(run_weekly_reports(report_service));

    let address = config.socket_address()?;
    let app = api_router::build_router(state, build_session_layer(&config))?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(%address, upload_dir = %config.upload_dir.display(), "taskhub api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("server failed: {error}")))
}

async fn run_overdue_scans(scanner: OverdueTaskService) {
    let mut interval = tokio::time::interval(OVERDUE_SCAN_INTERVAL);
    loop {
        interval.tick().await;
        match scanner.scan(Utc::now().date_naive()).await {
            Ok(0) => {}
            Ok(notified) => info!(notified, "overdue task notifications dispatched"),
            Err(scan_error) => error!(error = %scan_error, "overdue task scan failed"),
        }
    }
}

async fn run_weekly_reports(reports: WeeklyReportService) {
    let start = tokio::time::Instant::now() + WEEKLY_REPORT_INTERVAL;
    let mut interval = tokio::time::interval_at(start, WEEKLY_REPORT_INTERVAL);
    loop {
        interval.tick().await;
        if let Err(report_error) = reports.send(Utc::now()).await {
            error!(error = %report_error, "weekly report failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{OVERDUE_SCAN_INTERVAL, WEEKLY_REPORT_INTERVAL};

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn overdue_scan_runs_once_a_day_and_report_once_a_week() {
        assert_eq!(OVERDUE_SCAN_INTERVAL, DAY);
        assert_eq!(WEEKLY_REPORT_INTERVAL, DAY * 7);
    }
}
