use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use taskhub_core::{AppResult, UserId};
use taskhub_domain::{Task, TaskField, TaskStatus};

use crate::TaskActivity;

/// Task lifecycle event handed to the notification dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    /// A task was created with an assignee.
    Created {
        /// The new task.
        task: Task,
        /// The assignee to notify.
        assignee: UserId,
    },
    /// The workflow status changed.
    StatusChanged {
        /// Task after the change.
        task: Task,
        /// Previous status.
        from: TaskStatus,
    },
    /// The assignee changed.
    AssigneeChanged {
        /// Task after the change.
        task: Task,
        /// Previous assignee.
        from: Option<UserId>,
    },
    /// The due date changed.
    DueDateChanged {
        /// Task after the change.
        task: Task,
        /// Previous due date.
        from: Option<NaiveDate>,
    },
    /// The task is past due and still open.
    Overdue {
        /// The overdue task.
        task: Task,
        /// Whole days past due.
        days_overdue: i64,
    },
}

impl TaskEvent {
    /// Returns a stable event name for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created { .. } => "task_created",
            Self::StatusChanged { .. } => "task_status_changed",
            Self::AssigneeChanged { .. } => "task_assignee_changed",
            Self::DueDateChanged { .. } => "task_due_date_changed",
            Self::Overdue { .. } => "task_overdue",
        }
    }

    /// Returns the task the event refers to.
    #[must_use]
    pub fn task(&self) -> &Task {
        match self {
            Self::Created { task, .. }
            | Self::StatusChanged { task, .. }
            | Self::AssigneeChanged { task, .. }
            | Self::DueDateChanged { task, .. }
            | Self::Overdue { task, .. } => task,
        }
    }

    /// Returns the users who should hear about the event.
    #[must_use]
    pub fn recipients(&self) -> Vec<UserId> {
        let mut recipients = Vec::new();
        match self {
            Self::Created { assignee, .. } => recipients.push(*assignee),
            Self::AssigneeChanged { task, from } => {
                recipients.extend(task.assignee());
                recipients.extend(*from);
            }
            Self::StatusChanged { task, .. } | Self::DueDateChanged { task, .. } => {
                recipients.extend(task.assignee());
                recipients.push(task.creator());
            }
            Self::Overdue { task, .. } => recipients.extend(task.assignee()),
        }
        recipients.sort();
        recipients.dedup();
        recipients
    }
}

/// Explicit before/after snapshots of one task update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChange {
    /// Task as loaded before the update.
    pub before: Task,
    /// Task as persisted after the update.
    pub after: Task,
}

impl TaskChange {
    /// Derives notification events from the changed fields.
    #[must_use]
    pub fn events(&self) -> Vec<TaskEvent> {
        self.before
            .changed_fields(&self.after)
            .into_iter()
            .filter_map(|field| match field {
                TaskField::Status => Some(TaskEvent::StatusChanged {
                    task: self.after.clone(),
                    from: self.before.status(),
                }),
                TaskField::Assignee => Some(TaskEvent::AssigneeChanged {
                    task: self.after.clone(),
                    from: self.before.assignee(),
                }),
                TaskField::DueDate => Some(TaskEvent::DueDateChanged {
                    task: self.after.clone(),
                    from: self.before.due_date(),
                }),
                TaskField::Priority | TaskField::Title | TaskField::Description => None,
            })
            .collect()
    }
}

/// Task activity summary for administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyReport {
    /// Start of the reporting window.
    pub since: DateTime<Utc>,
    /// When the report was compiled.
    pub generated_at: DateTime<Utc>,
    /// Totals for the window.
    pub activity: TaskActivity,
}

/// Delivery port for task notifications.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Delivers one event to its recipients.
    async fn dispatch(&self, event: TaskEvent) -> AppResult<()>;

    /// Delivers a weekly report to administrators.
    async fn dispatch_report(&self, report: WeeklyReport) -> AppResult<()>;
}
