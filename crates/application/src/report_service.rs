//! Weekly task activity report.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use taskhub_core::AppResult;
use taskhub_domain::{Actor, Operation, ResourceKind};
use tracing::info;

use crate::access::{require_authenticated, require_decision};
use crate::{NotificationDispatcher, TaskRepository, WeeklyReport};

#[cfg(test)]
mod tests;

/// Length of the reporting window in days.
pub const REPORT_WINDOW_DAYS: i64 = 7;

/// Compiles weekly task summaries and hands them to the dispatcher.
#[derive(Clone)]
pub struct WeeklyReportService {
    task_repository: Arc<dyn TaskRepository>,
    notification_dispatcher: Arc<dyn NotificationDispatcher>,
}

impl WeeklyReportService {
    /// Creates a new report service.
    #[must_use]
    pub fn new(
        task_repository: Arc<dyn TaskRepository>,
        notification_dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            task_repository,
            notification_dispatcher,
        }
    }

    /// Compiles the report for the window ending at `now`.
    pub async fn compile(&self, now: DateTime<Utc>) -> AppResult<WeeklyReport> {
        let since = now - Duration::days(REPORT_WINDOW_DAYS);
        let activity = self.task_repository.activity_since(since).await?;

        Ok(WeeklyReport {
            since,
            generated_at: now,
            activity,
        })
    }

    /// Returns the current report. Administrators only.
    pub async fn current_report(&self, actor: &Actor) -> AppResult<WeeklyReport> {
        require_authenticated(actor)?;
        require_decision(
            actor.is_admin().into(),
            actor,
            Operation::List,
            ResourceKind::Task,
        )?;

        self.compile(Utc::now()).await
    }

    /// Compiles the report for the window ending at `now` and dispatches it.
    pub async fn send(&self, now: DateTime<Utc>) -> AppResult<WeeklyReport> {
        let report = self.compile(now).await?;
        self.notification_dispatcher.dispatch_report(report).await?;
        info!(
            created = report.activity.created,
            completed = report.activity.completed,
            total = report.activity.total,
            active = report.activity.active,
            "weekly report dispatched"
        );

        Ok(report)
    }
}
