use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use taskhub_core::{AppError, AppResult, NonEmptyString, ProjectId, TaskId, UserId};

use crate::Project;

/// Maximum task title length.
pub const TASK_TITLE_MAX_LENGTH: usize = 200;

/// Workflow status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    Todo,
    /// Being worked on.
    InProgress,
    /// Awaiting review.
    Review,
    /// Finished.
    Done,
    /// Waiting on something external.
    Blocked,
}

impl TaskStatus {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
            Self::Blocked => "blocked",
        }
    }

    /// Returns whether work on the task is still open for overdue tracking.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Todo | Self::InProgress)
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "done" => Ok(Self::Done),
            "blocked" => Ok(Self::Blocked),
            _ => Err(AppError::Validation(format!("unknown task status '{value}'"))),
        }
    }
}

/// Task priority. Ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Can wait.
    Low,
    /// Default priority.
    Medium,
    /// Should be picked up soon.
    High,
    /// Drop everything.
    Critical,
}

impl TaskPriority {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(AppError::Validation(format!(
                "unknown task priority '{value}'"
            ))),
        }
    }
}

/// Mutable task fields supplied on create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetails {
    /// Task title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Workflow status.
    pub status: TaskStatus,
    /// Priority.
    pub priority: TaskPriority,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
}

/// Task fields tracked for change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskField {
    /// Title changed.
    Title,
    /// Description changed.
    Description,
    /// Status changed.
    Status,
    /// Priority changed.
    Priority,
    /// Due date changed.
    DueDate,
    /// Assignee changed.
    Assignee,
}

/// A unit of work inside exactly one project.
///
/// When an assignee is present it is a member of the owning project at the
/// time of every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    project_id: ProjectId,
    title: NonEmptyString,
    description: String,
    status: TaskStatus,
    priority: TaskPriority,
    due_date: Option<NaiveDate>,
    assignee: Option<UserId>,
    creator: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a task inside `project`.
    pub fn create(
        project: &Project,
        creator: UserId,
        details: TaskDetails,
        assignee: Option<UserId>,
        today: NaiveDate,
    ) -> AppResult<Self> {
        let title = validate_title(details.title)?;
        validate_due_date(details.due_date, today)?;
        validate_assignee(project, assignee)?;

        let now = Utc::now();
        Ok(Self {
            id: TaskId::new(),
            project_id: project.id(),
            title,
            description: details.description,
            status: details.status,
            priority: details.priority,
            due_date: details.due_date,
            assignee,
            creator,
            created_at: now,
            updated_at: now,
            completed_at: (details.status == TaskStatus::Done).then_some(now),
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning project identifier.
    #[must_use]
    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &NonEmptyString {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the workflow status.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the due date.
    #[must_use]
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    /// Returns the assignee.
    #[must_use]
    pub fn assignee(&self) -> Option<UserId> {
        self.assignee
    }

    /// Returns the creator.
    #[must_use]
    pub fn creator(&self) -> UserId {
        self.creator
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns when the task last moved to `done`, `None` while it is not done.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns whether the task is past due and still open on `today`.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status.is_open() && self.due_date.is_some_and(|due_date| due_date < today)
    }

    /// Number of days past due on `today`, zero when not overdue.
    #[must_use]
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        match self.due_date {
            Some(due_date) if self.is_overdue(today) => (today - due_date).num_days(),
            _ => 0,
        }
    }

    /// Replaces mutable fields. A due date is only checked against `today`
    /// when it changes.
    pub fn update_details(&mut self, details: TaskDetails, today: NaiveDate) -> AppResult<()> {
        let title = validate_title(details.title)?;
        if details.due_date != self.due_date {
            validate_due_date(details.due_date, today)?;
        }

        self.title = title;
        self.description = details.description;
        self.priority = details.priority;
        self.due_date = details.due_date;
        self.touch();
        if details.status != self.status {
            self.completed_at = (details.status == TaskStatus::Done).then_some(self.updated_at);
            self.status = details.status;
        }
        Ok(())
    }

    /// Sets or clears the assignee. `project` must be the owning project.
    pub fn assign(&mut self, project: &Project, assignee: Option<UserId>) -> AppResult<()> {
        if project.id() != self.project_id {
            return Err(AppError::Validation(format!(
                "task '{}' belongs to project '{}', not '{}'",
                self.id,
                self.project_id,
                project.id()
            )));
        }

        validate_assignee(project, assignee)?;
        if self.assignee != assignee {
            self.assignee = assignee;
            self.touch();
        }
        Ok(())
    }

    /// Clears the assignee without a membership check.
    pub fn unassign(&mut self) {
        if self.assignee.take().is_some() {
            self.touch();
        }
    }

    /// Lists fields that differ between `self` (before) and `after`.
    #[must_use]
    pub fn changed_fields(&self, after: &Task) -> Vec<TaskField> {
        let mut changed = Vec::new();
        if self.status != after.status {
            changed.push(TaskField::Status);
        }
        if self.assignee != after.assignee {
            changed.push(TaskField::Assignee);
        }
        if self.due_date != after.due_date {
            changed.push(TaskField::DueDate);
        }
        if self.priority != after.priority {
            changed.push(TaskField::Priority);
        }
        if self.title != after.title {
            changed.push(TaskField::Title);
        }
        if self.description != after.description {
            changed.push(TaskField::Description);
        }
        changed
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn validate_title(title: String) -> AppResult<NonEmptyString> {
    if title.chars().count() > TASK_TITLE_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "task title must not exceed {TASK_TITLE_MAX_LENGTH} characters"
        )));
    }

    NonEmptyString::new(title.trim())
}

fn validate_due_date(due_date: Option<NaiveDate>, today: NaiveDate) -> AppResult<()> {
    match due_date {
        Some(due_date) if due_date < today => Err(AppError::Validation(format!(
            "due date {due_date} is in the past"
        ))),
        _ => Ok(()),
    }
}

fn validate_assignee(project: &Project, assignee: Option<UserId>) -> AppResult<()> {
    match assignee {
        Some(assignee) if !project.is_member(assignee) => Err(AppError::Validation(format!(
            "assignee '{assignee}' must be a member of project '{}'",
            project.id()
        ))),
        _ => Ok(()),
    }
}
