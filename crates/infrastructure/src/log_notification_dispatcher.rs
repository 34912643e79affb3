//! Notification dispatcher that writes task events to the log.

use async_trait::async_trait;
use taskhub_application::{NotificationDispatcher, TaskEvent, WeeklyReport};
use taskhub_core::AppResult;
use tracing::info;

/// Logs each task event instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct LogNotificationDispatcher;

impl LogNotificationDispatcher {
    /// Creates a new log dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn describe(event: &TaskEvent) -> String {
    let title = event.task().title().as_str();
    match event {
        TaskEvent::Created { .. } => format!("you were assigned '{title}'"),
        TaskEvent::StatusChanged { task, from } => format!(
            "'{title}' moved from {} to {}",
            from.as_str(),
            task.status().as_str()
        ),
        TaskEvent::AssigneeChanged { .. } => format!("'{title}' was reassigned"),
        TaskEvent::DueDateChanged { task, from } => format!(
            "'{title}' due date changed from {} to {}",
            from.map_or_else(|| "none".to_owned(), |date| date.to_string()),
            task.due_date()
                .map_or_else(|| "none".to_owned(), |date| date.to_string())
        ),
        TaskEvent::Overdue { days_overdue, .. } => {
            format!("'{title}' is {days_overdue} day(s) overdue")
        }
    }
}

fn summarize(report: &WeeklyReport) -> String {
    let activity = report.activity;
    format!(
        "weekly report since {}: {} created, {} completed; {} total, {} active, {} done",
        report.since.format("%d.%m.%Y"),
        activity.created,
        activity.completed,
        activity.total,
        activity.active,
        activity.finished()
    )
}

#[async_trait]
impl NotificationDispatcher for LogNotificationDispatcher {
    async fn dispatch(&self, event: TaskEvent) -> AppResult<()> {
        let recipients = event
            .recipients()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        info!(
            event = event.as_str(),
            task_id = %event.task().id(),
            recipients = %recipients,
            "{}",
            describe(&event)
        );

        Ok(())
    }

    async fn dispatch_report(&self, report: WeeklyReport) -> AppResult<()> {
        info!(
            event = "weekly_report",
            recipients = "admins",
            generated_at = %report.generated_at,
            "{}",
            summarize(&report)
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use taskhub_application::{NotificationDispatcher, TaskActivity, TaskEvent, WeeklyReport};
    use taskhub_core::{AppResult, UserId};
    use taskhub_domain::{Project, ProjectStatus, Task, TaskDetails, TaskPriority, TaskStatus};

    use super::{LogNotificationDispatcher, describe, summarize};

    fn task() -> AppResult<Task> {
        let creator = UserId::new();
        let project = Project::create(
            creator,
            "Apollo".to_owned(),
            String::new(),
            ProjectStatus::Active,
            Vec::new(),
        )?;
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap_or_default();
        Task::create(
            &project,
            creator,
            TaskDetails {
                title: "Fuel check".to_owned(),
                description: String::new(),
                status: TaskStatus::InProgress,
                priority: TaskPriority::High,
                due_date: Some(today),
            },
            Some(creator),
            today,
        )
    }

    #[test]
    fn describes_status_and_overdue_events() -> AppResult<()> {
        let status = TaskEvent::StatusChanged {
            task: task()?,
            from: TaskStatus::Todo,
        };
        assert_eq!(
            describe(&status),
            "'Fuel check' moved from todo to in_progress"
        );

        let overdue = TaskEvent::Overdue {
            task: task()?,
            days_overdue: 3,
        };
        assert_eq!(describe(&overdue), "'Fuel check' is 3 day(s) overdue");
        Ok(())
    }

    #[test]
    fn summarizes_weekly_report() {
        let since = Utc
            .with_ymd_and_hms(2025, 3, 3, 9, 0, 0)
            .single()
            .unwrap_or_default();
        let report = WeeklyReport {
            since,
            generated_at: since,
            activity: TaskActivity {
                created: 4,
                completed: 2,
                total: 10,
                active: 7,
            },
        };

        assert_eq!(
            summarize(&report),
            "weekly report since 03.03.2025: 4 created, 2 completed; 10 total, 7 active, 3 done"
        );
    }

    #[tokio::test]
    async fn dispatch_never_fails() -> AppResult<()> {
        let task = task()?;
        let assignee = task.assignee().unwrap_or_default();
        LogNotificationDispatcher::new()
            .dispatch(TaskEvent::Created { task, assignee })
            .await
    }
}
