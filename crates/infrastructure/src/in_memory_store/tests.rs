use chrono::{DateTime, NaiveDate, Utc};
use taskhub_application::{
    FileListQuery, FileRepository, ProjectRepository, StoredUser, TaskListQuery, TaskRepository,
    UserRepository,
};
use taskhub_core::{AppError, AppResult, Role, UserId};
use taskhub_domain::{
    AttachmentTarget, FileAttachment, NewFileAttachment, Project, ProjectStatus, ResourceKind,
    Task, TaskDetails, TaskPriority, TaskStatus, UserAccount, UserProfile, Username, Visibility,
    visible_set,
};

use super::InMemoryStore;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap_or_default()
}

async fn seed_user(store: &InMemoryStore, username: &str, role: Role) -> AppResult<UserAccount> {
    let mut account = UserAccount::register(Username::new(username)?, None, UserProfile::default());
    account.set_role(role);
    store
        .create(account.clone(), format!("hash-of-{username}"))
        .await?;
    Ok(account)
}

async fn seed_project(
    store: &InMemoryStore,
    creator: &UserAccount,
    members: Vec<UserId>,
) -> AppResult<Project> {
    let project = Project::create(
        creator.id(),
        "Apollo",
        "",
        ProjectStatus::Active,
        members,
    )?;
    ProjectRepository::insert(store, project.clone()).await?;
    Ok(project)
}

async fn seed_task(
    store: &InMemoryStore,
    project: &Project,
    creator: &UserAccount,
    assignee: Option<UserId>,
    due_date: Option<NaiveDate>,
) -> AppResult<Task> {
    let task = Task::create(
        project,
        creator.id(),
        TaskDetails {
            title: "Fuel check".to_owned(),
            description: String::new(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date,
        },
        assignee,
        today(),
    )?;
    TaskRepository::insert(store, task.clone()).await?;
    Ok(task)
}

async fn seed_file(
    store: &InMemoryStore,
    uploaded_by: &UserAccount,
    target: AttachmentTarget,
    is_public: bool,
) -> AppResult<FileAttachment> {
    let file = FileAttachment::create(
        uploaded_by.id(),
        NewFileAttachment {
            original_filename: "report.pdf".to_owned(),
            mime_type: "application/pdf".to_owned(),
            size: 42,
            target,
            description: String::new(),
            is_public,
        },
    )?;
    FileRepository::insert(store, file.clone()).await?;
    Ok(file)
}

fn visibility_for(account: &UserAccount, kind: ResourceKind) -> Visibility {
    visible_set(&taskhub_domain::Actor::Authenticated(account.identity()), kind)
}

#[tokio::test]
async fn usernames_are_unique_ignoring_case() -> AppResult<()> {
    let store = InMemoryStore::new();
    seed_user(&store, "dana", Role::Employee).await?;

    let duplicate = seed_user(&store, "DANA", Role::Employee).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let found: Option<StoredUser> = store.find_by_username("Dana").await?;
    assert_eq!(
        found.map(|stored| stored.password_hash),
        Some("hash-of-dana".to_owned())
    );
    Ok(())
}

#[tokio::test]
async fn user_listing_applies_visibility_and_sorts_by_username() -> AppResult<()> {
    let store = InMemoryStore::new();
    let zoe = seed_user(&store, "zoe", Role::Employee).await?;
    seed_user(&store, "adam", Role::Manager).await?;

    let everyone = UserRepository::list(&store, &Visibility::Everything).await?;
    let names: Vec<&str> = everyone
        .iter()
        .map(|account| account.username().as_str())
        .collect();
    assert_eq!(names, vec!["adam", "zoe"]);

    let own = UserRepository::list(&store, &visibility_for(&zoe, ResourceKind::User)).await?;
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].id(), zoe.id());
    Ok(())
}

#[tokio::test]
async fn employee_sees_only_assigned_tasks() -> AppResult<()> {
    let store = InMemoryStore::new();
    let manager = seed_user(&store, "mia", Role::Manager).await?;
    let erin = seed_user(&store, "erin", Role::Employee).await?;
    let olaf = seed_user(&store, "olaf", Role::Employee).await?;
    let project = seed_project(&store, &manager, vec![erin.id(), olaf.id()]).await?;

    seed_task(&store, &project, &manager, Some(erin.id()), None).await?;
    seed_task(&store, &project, &manager, None, None).await?;

    let query = TaskListQuery::default();
    let for_erin =
        TaskRepository::list(&store, &visibility_for(&erin, ResourceKind::Task), &query).await?;
    let for_olaf =
        TaskRepository::list(&store, &visibility_for(&olaf, ResourceKind::Task), &query).await?;
    let for_manager =
        TaskRepository::list(&store, &visibility_for(&manager, ResourceKind::Task), &query)
            .await?;

    assert_eq!(for_erin.len(), 1);
    assert!(for_olaf.is_empty());
    assert_eq!(for_manager.len(), 2);
    Ok(())
}

#[tokio::test]
async fn saving_a_task_with_non_member_assignee_is_rejected() -> AppResult<()> {
    let store = InMemoryStore::new();
    let manager = seed_user(&store, "mia", Role::Manager).await?;
    let outsider = seed_user(&store, "olaf", Role::Employee).await?;
    let project = seed_project(&store, &manager, Vec::new()).await?;
    let task = seed_task(&store, &project, &manager, None, None).await?;

    let mut widened = project.clone();
    widened.add_member(outsider.id());
    let mut reassigned = task.clone();
    reassigned.assign(&widened, Some(outsider.id()))?;

    let result = TaskRepository::save(&store, reassigned).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn member_with_assigned_tasks_cannot_be_removed() -> AppResult<()> {
    let store = InMemoryStore::new();
    let manager = seed_user(&store, "mia", Role::Manager).await?;
    let erin = seed_user(&store, "erin", Role::Employee).await?;
    let olaf = seed_user(&store, "olaf", Role::Employee).await?;
    let project = seed_project(&store, &manager, vec![erin.id(), olaf.id()]).await?;
    seed_task(&store, &project, &manager, Some(erin.id()), None).await?;

    let blocked = store.remove_member(project.id(), erin.id()).await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));

    let creator = store.remove_member(project.id(), manager.id()).await;
    assert!(matches!(creator, Err(AppError::Conflict(_))));

    let updated = store.remove_member(project.id(), olaf.id()).await?;
    assert!(!updated.is_member(olaf.id()));
    assert!(updated.is_member(erin.id()));
    Ok(())
}

#[tokio::test]
async fn project_delete_cascades_to_tasks_and_files() -> AppResult<()> {
    let store = InMemoryStore::new();
    let manager = seed_user(&store, "mia", Role::Manager).await?;
    let project = seed_project(&store, &manager, Vec::new()).await?;
    let task = seed_task(&store, &project, &manager, None, None).await?;
    seed_file(&store, &manager, AttachmentTarget::Project(project.id()), false).await?;
    seed_file(&store, &manager, AttachmentTarget::Task(task.id()), false).await?;
    let personal = seed_file(&store, &manager, AttachmentTarget::User(manager.id()), false).await?;

    let removed = ProjectRepository::delete(&store, project.id()).await?;
    assert_eq!(removed.len(), 2);
    assert!(TaskRepository::find_by_id(&store, task.id()).await?.is_none());

    let remaining = FileRepository::list(
        &store,
        &Visibility::Everything,
        &FileListQuery::default(),
    )
    .await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id(), personal.id());

    let again = ProjectRepository::delete(&store, project.id()).await;
    assert!(matches!(again, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn user_delete_unassigns_tasks_and_drops_owned_data() -> AppResult<()> {
    let store = InMemoryStore::new();
    let manager = seed_user(&store, "mia", Role::Manager).await?;
    let erin = seed_user(&store, "erin", Role::Employee).await?;
    let owned = seed_project(&store, &erin, Vec::new()).await?;
    let shared = seed_project(&store, &manager, vec![erin.id()]).await?;
    let task = seed_task(&store, &shared, &manager, Some(erin.id()), None).await?;
    seed_file(&store, &erin, AttachmentTarget::User(erin.id()), true).await?;

    let removed = UserRepository::delete(&store, erin.id()).await?;
    assert_eq!(removed.len(), 1);

    assert!(ProjectRepository::find_by_id(&store, owned.id()).await?.is_none());
    let shared = ProjectRepository::find_by_id(&store, shared.id()).await?;
    assert_eq!(shared.map(|project| project.is_member(erin.id())), Some(false));
    let task = TaskRepository::find_by_id(&store, task.id()).await?;
    assert_eq!(task.and_then(|task| task.assignee()), None);
    assert!(UserRepository::find_by_id(&store, erin.id()).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn file_visibility_follows_public_flag_and_relations() -> AppResult<()> {
    let store = InMemoryStore::new();
    let manager = seed_user(&store, "mia", Role::Manager).await?;
    let erin = seed_user(&store, "erin", Role::Employee).await?;
    let olaf = seed_user(&store, "olaf", Role::Employee).await?;
    let project = seed_project(&store, &manager, vec![erin.id()]).await?;

    seed_file(&store, &manager, AttachmentTarget::Project(project.id()), false).await?;
    seed_file(&store, &manager, AttachmentTarget::User(manager.id()), true).await?;

    let query = FileListQuery::default();
    let for_erin =
        FileRepository::list(&store, &visibility_for(&erin, ResourceKind::File), &query).await?;
    let for_olaf =
        FileRepository::list(&store, &visibility_for(&olaf, ResourceKind::File), &query).await?;

    assert_eq!(for_erin.len(), 2);
    assert_eq!(for_olaf.len(), 1);
    assert!(for_olaf[0].is_public());
    Ok(())
}

#[tokio::test]
async fn overdue_listing_and_counts() -> AppResult<()> {
    let store = InMemoryStore::new();
    let manager = seed_user(&store, "mia", Role::Manager).await?;
    let project = seed_project(&store, &manager, Vec::new()).await?;
    seed_task(&store, &project, &manager, None, Some(today())).await?;
    seed_task(&store, &project, &manager, None, None).await?;

    let later = today().succ_opt().unwrap_or_default();
    assert!(store.list_overdue(today()).await?.is_empty());
    assert_eq!(store.list_overdue(later).await?.len(), 1);

    let counts = store.count_for_project(project.id()).await?;
    assert_eq!((counts.total, counts.done), (2, 0));
    Ok(())
}

#[tokio::test]
async fn download_is_recorded_on_the_stored_file() -> AppResult<()> {
    let store = InMemoryStore::new();
    let manager = seed_user(&store, "mia", Role::Manager).await?;
    let file = seed_file(&store, &manager, AttachmentTarget::Unattached, false).await?;
    let at: DateTime<Utc> = Utc::now();

    let updated = store.record_download(file.id(), at).await?;
    assert_eq!(updated.download_count(), 1);
    assert_eq!(updated.last_accessed(), Some(at));

    let deleted = FileRepository::delete(&store, file.id()).await?;
    assert!(deleted.is_some());
    assert!(FileRepository::delete(&store, file.id()).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn detail_update_after_concurrent_member_add_keeps_membership() -> AppResult<()> {
    let store = InMemoryStore::new();
    let manager = seed_user(&store, "mia", Role::Manager).await?;
    let member = seed_user(&store, "erin", Role::Employee).await?;
    let project = seed_project(&store, &manager, Vec::new()).await?;

    let loaded_before_add = ProjectRepository::find_by_id(&store, project.id())
        .await?
        .ok_or_else(|| AppError::NotFound("project".to_owned()))?;
    assert!(!loaded_before_add.is_member(member.id()));

    let (with_member, added) =
        ProjectRepository::add_member(&store, project.id(), member.id()).await?;
    assert!(added);
    let task = seed_task(&store, &with_member, &manager, Some(member.id()), None).await?;

    let renamed = store
        .update_details(
            loaded_before_add.id(),
            "Apollo 2".to_owned(),
            String::new(),
            ProjectStatus::OnHold,
        )
        .await?;
    assert_eq!(renamed.name().as_str(), "Apollo 2");
    assert!(renamed.is_member(member.id()));

    let stored_task = TaskRepository::find_by_id(&store, task.id())
        .await?
        .ok_or_else(|| AppError::NotFound("task".to_owned()))?;
    let assignee = stored_task
        .assignee()
        .ok_or_else(|| AppError::NotFound("assignee".to_owned()))?;
    assert!(renamed.is_member(assignee));

    let (_, added_again) =
        ProjectRepository::add_member(&store, project.id(), member.id()).await?;
    assert!(!added_again);
    let unknown = ProjectRepository::add_member(&store, project.id(), UserId::new()).await;
    assert!(matches!(unknown, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn invalid_detail_update_leaves_project_unchanged() -> AppResult<()> {
    let store = InMemoryStore::new();
    let manager = seed_user(&store, "mia", Role::Manager).await?;
    let project = seed_project(&store, &manager, Vec::new()).await?;

    let result = store
        .update_details(project.id(), "   ".to_owned(), String::new(), ProjectStatus::Completed)
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let stored = ProjectRepository::find_by_id(&store, project.id())
        .await?
        .ok_or_else(|| AppError::NotFound("project".to_owned()))?;
    assert_eq!(stored.name().as_str(), "Apollo");
    assert_eq!(stored.status(), ProjectStatus::Active);
    Ok(())
}

#[tokio::test]
async fn metadata_update_keeps_download_statistics() -> AppResult<()> {
    let store = InMemoryStore::new();
    let manager = seed_user(&store, "mia", Role::Manager).await?;
    let file = seed_file(&store, &manager, AttachmentTarget::Unattached, false).await?;
    let at: DateTime<Utc> = Utc::now();

    store.record_download(file.id(), at).await?;
    let updated = store
        .update_metadata(file.id(), "Quarterly".to_owned(), true)
        .await?;

    assert_eq!(updated.description(), "Quarterly");
    assert!(updated.is_public());
    assert_eq!(updated.download_count(), 1);
    assert_eq!(updated.last_accessed(), Some(at));
    Ok(())
}
