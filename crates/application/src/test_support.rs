//! Fakes shared by service tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use taskhub_core::{AppError, AppResult, FileId, ProjectId, Role, TaskId, UserId};
use taskhub_domain::{
    AccessPolicy, Actor, FileAttachment, FileScope, Project, ProjectStatus, Task, TaskScope,
    TaskStatus, UserAccount, UserProfile, Username, Visibility,
};

use crate::{
    FileListQuery, FileRepository, FileService, FileStorage, NotificationDispatcher,
    PasswordHasher, ProjectRepository, ProjectService, StoredUser, TaskActivity, TaskCounts,
    TaskEvent, TaskListQuery, TaskRepository, TaskService, UserRepository, UserService,
    WeeklyReport, WeeklyReportService,
};

#[derive(Default)]
struct FakeState {
    users: HashMap<UserId, StoredUser>,
    projects: HashMap<ProjectId, Project>,
    tasks: HashMap<TaskId, Task>,
    files: HashMap<FileId, FileAttachment>,
}

impl FakeState {
    fn file_visible(&self, visibility: &Visibility, file: &FileAttachment) -> bool {
        let project = file.project().and_then(|id| self.projects.get(&id));
        let task = file.task().and_then(|id| self.tasks.get(&id)).and_then(|task| {
            self.projects
                .get(&task.project_id())
                .map(|project| TaskScope::new(task, project))
        });

        let mut scope = FileScope::new(file);
        if let Some(project) = project {
            scope = scope.with_project(project);
        }
        if let Some(task) = task {
            scope = scope.with_task(task);
        }
        visibility.admits_file(scope)
    }

    fn check_assignee(&self, task: &Task) -> AppResult<()> {
        let project = self.projects.get(&task.project_id()).ok_or_else(|| {
            AppError::NotFound(format!("project '{}' does not exist", task.project_id()))
        })?;
        match task.assignee() {
            Some(assignee) if !project.is_member(assignee) => Err(AppError::Validation(
                format!("assignee '{assignee}' is not a project member"),
            )),
            _ => Ok(()),
        }
    }

    fn remove_task(&mut self, task_id: TaskId) -> Vec<FileAttachment> {
        self.tasks.remove(&task_id);
        self.drain_files(|file| file.task() == Some(task_id))
    }

    fn remove_project(&mut self, project_id: ProjectId) -> Vec<FileAttachment> {
        self.projects.remove(&project_id);
        let task_ids: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|task| task.project_id() == project_id)
            .map(Task::id)
            .collect();
        let mut removed = self.drain_files(|file| file.project() == Some(project_id));
        for task_id in task_ids {
            removed.extend(self.remove_task(task_id));
        }
        removed
    }

    fn drain_files(&mut self, predicate: impl Fn(&FileAttachment) -> bool) -> Vec<FileAttachment> {
        let ids: Vec<FileId> = self
            .files
            .values()
            .filter(|file| predicate(file))
            .map(FileAttachment::id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.files.remove(&id))
            .collect()
    }
}

/// Single fake store implementing every repository port.
#[derive(Default)]
pub(crate) struct FakeStore {
    state: Mutex<FakeState>,
}

impl FakeStore {
    pub(crate) async fn seed_user(&self, account: UserAccount) {
        self.state.lock().await.users.insert(
            account.id(),
            StoredUser {
                account,
                password_hash: "hashed:correct horse battery".to_owned(),
            },
        );
    }

    pub(crate) async fn file_count(&self) -> usize {
        self.state.lock().await.files.len()
    }
}

#[async_trait]
impl UserRepository for FakeStore {
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<StoredUser>> {
        Ok(self.state.lock().await.users.get(&user_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<StoredUser>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .values()
            .find(|stored| {
                stored
                    .account
                    .username()
                    .as_str()
                    .eq_ignore_ascii_case(username)
            })
            .cloned())
    }

    async fn list(&self, visibility: &Visibility) -> AppResult<Vec<UserAccount>> {
        let state = self.state.lock().await;
        let mut accounts: Vec<UserAccount> = state
            .users
            .values()
            .map(|stored| stored.account.clone())
            .filter(|account| visibility.admits_user(account))
            .collect();
        accounts.sort_by(|left, right| left.username().as_str().cmp(right.username().as_str()));
        Ok(accounts)
    }

    async fn create(&self, account: UserAccount, password_hash: String) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|stored| {
            stored
                .account
                .username()
                .as_str()
                .eq_ignore_ascii_case(account.username().as_str())
        }) {
            return Err(AppError::Conflict("username taken".to_owned()));
        }
        state.users.insert(
            account.id(),
            StoredUser {
                account,
                password_hash,
            },
        );
        Ok(())
    }

    async fn save(&self, account: UserAccount) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let stored = state
            .users
            .get_mut(&account.id())
            .ok_or_else(|| AppError::NotFound("user missing".to_owned()))?;
        stored.account = account;
        Ok(())
    }

    async fn update_password(&self, user_id: UserId, password_hash: String) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let stored = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("user missing".to_owned()))?;
        stored.password_hash = password_hash;
        Ok(())
    }

    async fn delete(&self, user_id: UserId) -> AppResult<Vec<FileAttachment>> {
        let mut state = self.state.lock().await;
        state.users.remove(&user_id);

        let created: Vec<ProjectId> = state
            .projects
            .values()
            .filter(|project| project.creator() == user_id)
            .map(Project::id)
            .collect();
        let mut removed = Vec::new();
        for project_id in created {
            removed.extend(state.remove_project(project_id));
        }
        for project in state.projects.values_mut() {
            let _ = project.remove_member(user_id);
        }
        for task in state.tasks.values_mut() {
            if task.assignee() == Some(user_id) {
                task.unassign();
            }
        }
        removed.extend(
            state.drain_files(|file| file.uploaded_by() == user_id || file.user() == Some(user_id)),
        );
        Ok(removed)
    }
}

#[async_trait]
impl ProjectRepository for FakeStore {
    async fn find_by_id(&self, project_id: ProjectId) -> AppResult<Option<Project>> {
        Ok(self.state.lock().await.projects.get(&project_id).cloned())
    }

    async fn list(&self, visibility: &Visibility) -> AppResult<Vec<Project>> {
        Ok(self
            .state
            .lock()
            .await
            .projects
            .values()
            .filter(|project| visibility.admits_project(project))
            .cloned()
            .collect())
    }

    async fn insert(&self, project: Project) -> AppResult<()> {
        self.state
            .lock()
            .await
            .projects
            .insert(project.id(), project);
        Ok(())
    }

    async fn update_details(
        &self,
        project_id: ProjectId,
        name: String,
        description: String,
        status: ProjectStatus,
    ) -> AppResult<Project> {
        let mut state = self.state.lock().await;
        let project = state
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| AppError::NotFound("project missing".to_owned()))?;
        project.update_details(name, description, status)?;
        Ok(project.clone())
    }

    async fn add_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> AppResult<(Project, bool)> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&user_id) {
            return Err(AppError::Validation("user missing".to_owned()));
        }
        let project = state
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| AppError::NotFound("project missing".to_owned()))?;
        let added = project.add_member(user_id);
        Ok((project.clone(), added))
    }

    async fn remove_member(&self, project_id: ProjectId, user_id: UserId) -> AppResult<Project> {
        let mut state = self.state.lock().await;
        if state
            .tasks
            .values()
            .any(|task| task.project_id() == project_id && task.assignee() == Some(user_id))
        {
            return Err(AppError::Conflict("member still has tasks".to_owned()));
        }
        let project = state
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| AppError::NotFound("project missing".to_owned()))?;
        project.remove_member(user_id)?;
        Ok(project.clone())
    }

    async fn delete(&self, project_id: ProjectId) -> AppResult<Vec<FileAttachment>> {
        Ok(self.state.lock().await.remove_project(project_id))
    }
}

#[async_trait]
impl TaskRepository for FakeStore {
    async fn find_by_id(&self, task_id: TaskId) -> AppResult<Option<Task>> {
        Ok(self.state.lock().await.tasks.get(&task_id).cloned())
    }

    async fn list(&self, visibility: &Visibility, query: &TaskListQuery) -> AppResult<Vec<Task>> {
        let state = self.state.lock().await;
        Ok(state
            .tasks
            .values()
            .filter(|task| query.matches(task))
            .filter(|task| {
                state
                    .projects
                    .get(&task.project_id())
                    .is_some_and(|project| visibility.admits_task(TaskScope::new(task, project)))
            })
            .cloned()
            .collect())
    }

    async fn count_for_project(&self, project_id: ProjectId) -> AppResult<TaskCounts> {
        let state = self.state.lock().await;
        let tasks = state
            .tasks
            .values()
            .filter(|task| task.project_id() == project_id);
        let mut counts = TaskCounts::default();
        for task in tasks {
            counts.total += 1;
            if task.status() == TaskStatus::Done {
                counts.done += 1;
            }
        }
        Ok(counts)
    }

    async fn activity_since(&self, since: DateTime<Utc>) -> AppResult<TaskActivity> {
        let state = self.state.lock().await;
        let mut activity = TaskActivity::default();
        for task in state.tasks.values() {
            activity = activity.record(task, since);
        }
        Ok(activity)
    }

    async fn list_overdue(&self, today: NaiveDate) -> AppResult<Vec<Task>> {
        Ok(self
            .state
            .lock()
            .await
            .tasks
            .values()
            .filter(|task| task.is_overdue(today))
            .cloned()
            .collect())
    }

    async fn insert(&self, task: Task) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.check_assignee(&task)?;
        state.tasks.insert(task.id(), task);
        Ok(())
    }

    async fn save(&self, task: Task) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.check_assignee(&task)?;
        state.tasks.insert(task.id(), task);
        Ok(())
    }

    async fn delete(&self, task_id: TaskId) -> AppResult<Vec<FileAttachment>> {
        Ok(self.state.lock().await.remove_task(task_id))
    }
}

#[async_trait]
impl FileRepository for FakeStore {
    async fn find_by_id(&self, file_id: FileId) -> AppResult<Option<FileAttachment>> {
        Ok(self.state.lock().await.files.get(&file_id).cloned())
    }

    async fn list(
        &self,
        visibility: &Visibility,
        query: &FileListQuery,
    ) -> AppResult<Vec<FileAttachment>> {
        let state = self.state.lock().await;
        Ok(state
            .files
            .values()
            .filter(|file| query.matches(file) && state.file_visible(visibility, file))
            .cloned()
            .collect())
    }

    async fn insert(&self, file: FileAttachment) -> AppResult<()> {
        self.state.lock().await.files.insert(file.id(), file);
        Ok(())
    }

    async fn update_metadata(
        &self,
        file_id: FileId,
        description: String,
        is_public: bool,
    ) -> AppResult<FileAttachment> {
        let mut state = self.state.lock().await;
        let file = state
            .files
            .get_mut(&file_id)
            .ok_or_else(|| AppError::NotFound("file missing".to_owned()))?;
        file.update_metadata(description, is_public)?;
        Ok(file.clone())
    }

    async fn record_download(
        &self,
        file_id: FileId,
        at: DateTime<Utc>,
    ) -> AppResult<FileAttachment> {
        let mut state = self.state.lock().await;
        let file = state
            .files
            .get_mut(&file_id)
            .ok_or_else(|| AppError::NotFound("file missing".to_owned()))?;
        file.record_download(at);
        Ok(file.clone())
    }

    async fn delete(&self, file_id: FileId) -> AppResult<Option<FileAttachment>> {
        Ok(self.state.lock().await.files.remove(&file_id))
    }
}

/// Reversible fake hasher: `hashed:<password>`.
pub(crate) struct FakePasswordHasher;

impl PasswordHasher for FakePasswordHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        Ok(format!("hashed:{password}"))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        Ok(hash == format!("hashed:{password}"))
    }
}

/// Blob store kept in memory.
#[derive(Default)]
pub(crate) struct FakeFileStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl FakeFileStorage {
    pub(crate) async fn contains(&self, path: &str) -> bool {
        self.blobs.lock().await.contains_key(path)
    }
}

#[async_trait]
impl FileStorage for FakeFileStorage {
    async fn store(&self, path: &str, content: &[u8]) -> AppResult<()> {
        let mut blobs = self.blobs.lock().await;
        if blobs.contains_key(path) {
            return Err(AppError::Conflict(format!("blob '{path}' exists")));
        }
        blobs.insert(path.to_owned(), content.to_vec());
        Ok(())
    }

    async fn load(&self, path: &str) -> AppResult<Vec<u8>> {
        self.blobs
            .lock()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("blob '{path}' missing")))
    }

    async fn remove(&self, path: &str) -> AppResult<()> {
        self.blobs.lock().await.remove(path);
        Ok(())
    }
}

/// Dispatcher that records every event.
#[derive(Default)]
pub(crate) struct RecordingDispatcher {
    events: Mutex<Vec<TaskEvent>>,
    reports: Mutex<Vec<WeeklyReport>>,
}

impl RecordingDispatcher {
    pub(crate) async fn event_names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .await
            .iter()
            .map(TaskEvent::as_str)
            .collect()
    }

    pub(crate) async fn reports(&self) -> Vec<WeeklyReport> {
        self.reports.lock().await.clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn dispatch(&self, event: TaskEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }

    async fn dispatch_report(&self, report: WeeklyReport) -> AppResult<()> {
        self.reports.lock().await.push(report);
        Ok(())
    }
}

/// Every service wired against one fake store.
pub(crate) struct Harness {
    pub(crate) store: Arc<FakeStore>,
    pub(crate) storage: Arc<FakeFileStorage>,
    pub(crate) dispatcher: Arc<RecordingDispatcher>,
    pub(crate) users: UserService,
    pub(crate) projects: ProjectService,
    pub(crate) tasks: TaskService,
    pub(crate) files: FileService,
    pub(crate) reports: WeeklyReportService,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_policy(AccessPolicy::default())
    }

    pub(crate) fn with_policy(policy: AccessPolicy) -> Self {
        let store = Arc::new(FakeStore::default());
        let storage = Arc::new(FakeFileStorage::default());
        let dispatcher = Arc::new(RecordingDispatcher::default());

        Self {
            users: UserService::new(
                store.clone(),
                Arc::new(FakePasswordHasher),
                storage.clone(),
                policy,
            ),
            projects: ProjectService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                storage.clone(),
                policy,
            ),
            tasks: TaskService::new(
                store.clone(),
                store.clone(),
                storage.clone(),
                dispatcher.clone(),
                policy,
            ),
            files: FileService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                storage.clone(),
                policy,
                1024 * 1024,
            ),
            reports: WeeklyReportService::new(store.clone(), dispatcher.clone()),
            store,
            storage,
            dispatcher,
        }
    }

    /// Seeds an account with `role` and returns its actor.
    pub(crate) async fn actor(&self, username: &str, role: Role) -> Actor {
        let username = Username::new(username)
            .unwrap_or_else(|error| panic!("fixture username should be valid: {error}"));
        let mut account = UserAccount::register(username, None, UserProfile::default());
        account.set_role(role);
        let identity = account.identity();
        self.store.seed_user(account).await;
        Actor::Authenticated(identity)
    }
}

pub(crate) fn id_of(actor: &Actor) -> UserId {
    actor
        .user_id()
        .unwrap_or_else(|| panic!("fixture actor should be authenticated"))
}
