use chrono::{Duration, Utc};
use taskhub_core::{AppError, AppResult, Role};
use taskhub_domain::{Actor, ProjectStatus, TaskDetails, TaskPriority, TaskStatus};

use crate::test_support::{Harness, id_of};
use crate::{CreateProjectInput, CreateTaskInput, REPORT_WINDOW_DAYS, UpdateTaskInput};

fn details(title: &str, status: TaskStatus) -> TaskDetails {
    TaskDetails {
        title: title.to_owned(),
        description: String::new(),
        status,
        priority: TaskPriority::Medium,
        due_date: None,
    }
}

async fn seeded_harness() -> AppResult<(Harness, Actor)> {
    let harness = Harness::new();
    let manager = harness.actor("mia", Role::Manager).await;
    let project = harness
        .projects
        .create_project(
            &manager,
            CreateProjectInput {
                name: "Apollo".to_owned(),
                description: String::new(),
                status: ProjectStatus::Active,
                members: Vec::new(),
            },
        )
        .await?;

    let mut tasks = Vec::new();
    for title in ["Fuel check", "Hull scan", "Crew brief"] {
        let task = harness
            .tasks
            .create_task(
                &manager,
                CreateTaskInput {
                    project_id: project.id(),
                    details: details(title, TaskStatus::Todo),
                    assignee: Some(id_of(&manager)),
                },
            )
            .await?;
        tasks.push(task);
    }

    harness
        .tasks
        .update_task(
            &manager,
            tasks[0].id(),
            UpdateTaskInput {
                details: details("Fuel check", TaskStatus::Done),
                assignee: Some(id_of(&manager)),
            },
        )
        .await?;

    Ok((harness, manager))
}

#[tokio::test]
async fn report_counts_created_completed_and_active_tasks() -> AppResult<()> {
    let (harness, _) = seeded_harness().await?;
    let now = Utc::now();

    let report = harness.reports.compile(now).await?;
    assert_eq!(report.since, now - Duration::days(REPORT_WINDOW_DAYS));
    assert_eq!(report.activity.created, 3);
    assert_eq!(report.activity.completed, 1);
    assert_eq!(report.activity.total, 3);
    assert_eq!(report.activity.active, 2);
    assert_eq!(report.activity.finished(), 1);
    Ok(())
}

#[tokio::test]
async fn activity_older_than_the_window_is_not_counted_as_recent() -> AppResult<()> {
    let (harness, _) = seeded_harness().await?;
    let next_month = Utc::now() + Duration::days(30);

    let report = harness.reports.compile(next_month).await?;
    assert_eq!(report.activity.created, 0);
    assert_eq!(report.activity.completed, 0);
    assert_eq!(report.activity.total, 3);
    assert_eq!(report.activity.active, 2);
    Ok(())
}

#[tokio::test]
async fn sending_hands_the_report_to_the_dispatcher() -> AppResult<()> {
    let (harness, _) = seeded_harness().await?;

    let sent = harness.reports.send(Utc::now()).await?;
    assert_eq!(harness.dispatcher.reports().await, vec![sent]);
    Ok(())
}

#[tokio::test]
async fn current_report_is_admin_only() -> AppResult<()> {
    let (harness, manager) = seeded_harness().await?;
    let admin = harness.actor("root", Role::Admin).await;

    let denied = harness.reports.current_report(&manager).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
    let anonymous = harness.reports.current_report(&Actor::Anonymous).await;
    assert!(matches!(anonymous, Err(AppError::Unauthorized(_))));

    let report = harness.reports.current_report(&admin).await?;
    assert_eq!(report.activity.total, 3);
    Ok(())
}
