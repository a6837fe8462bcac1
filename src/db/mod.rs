//! Backend seam: the six record collections plus the auth API.
//!
//! [`PgDatabase`] talks to the hosted Postgres; [`MemoryDatabase`] keeps
//! everything in process and backs the test suite and `--demo` mode.

mod memory;
mod postgres;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::Config;
use crate::error::BackendError;
use crate::models::{
    AssignedTask, AssignmentView, ChecklistItem, Column, MemberView, NewAssignment,
    NewChecklistItem, NewMember, NewProject, NewTask, Project, ProjectMember, Session, Task,
    TaskAssignment, TaskView, UserProfile,
};

pub use memory::{MemoryDatabase, DEMO_ACCOUNTS, DEMO_PASSWORD};
pub use postgres::PgDatabase;

pub type DbResult<T> = std::result::Result<T, BackendError>;

/// Holds the current session and notifies observers when it changes.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<Option<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    pub fn set(&self, session: Option<Session>) {
        self.tx.send_replace(session);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
pub trait Database: Send + Sync {
    fn sessions(&self) -> &SessionStore;

    fn session(&self) -> Option<Session> {
        self.sessions().current()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.sessions().subscribe()
    }

    // Auth operations
    async fn sign_in(&self, email: &str, password: &str) -> DbResult<Session>;
    async fn sign_up(&self, email: &str, password: &str) -> DbResult<Uuid>;
    async fn sign_out(&self) -> DbResult<()>;

    // Profile operations
    async fn get_profile(&self, user_id: Uuid) -> DbResult<UserProfile>;
    async fn create_profile(&self, profile: &UserProfile) -> DbResult<UserProfile>;
    async fn list_profiles(&self) -> DbResult<Vec<UserProfile>>;

    // Project operations
    async fn list_active_projects(&self) -> DbResult<Vec<Project>>;
    async fn get_project(&self, id: Uuid) -> DbResult<Project>;
    /// Inserts the project and an editor membership row for its owner.
    async fn create_project(&self, project: &NewProject) -> DbResult<Project>;

    // Member operations
    async fn get_membership(&self, project_id: Uuid, user_id: Uuid) -> DbResult<Option<ProjectMember>>;
    async fn list_members(&self, project_id: Uuid) -> DbResult<Vec<MemberView>>;
    async fn add_member(&self, member: &NewMember) -> DbResult<ProjectMember>;

    // Task operations
    /// Tasks of a project, newest first, with checklists and assignments.
    async fn list_tasks(&self, project_id: Uuid) -> DbResult<Vec<TaskView>>;
    async fn get_task(&self, id: Uuid) -> DbResult<Task>;
    async fn create_task(&self, task: &NewTask) -> DbResult<Task>;
    async fn delete_task(&self, id: Uuid) -> DbResult<()>;
    async fn set_task_column(&self, id: Uuid, column: Column) -> DbResult<()>;
    async fn list_assigned_tasks(&self, user_id: Uuid) -> DbResult<Vec<AssignedTask>>;

    // Checklist operations
    /// Items of a task ordered by position.
    async fn list_checklist(&self, task_id: Uuid) -> DbResult<Vec<ChecklistItem>>;
    async fn add_checklist_item(&self, item: &NewChecklistItem) -> DbResult<ChecklistItem>;
    /// Sets `is_completed` to `completed_at.is_some()` and stores the stamp.
    async fn set_checklist_completion(
        &self,
        id: Uuid,
        completed_at: Option<DateTime<Utc>>,
    ) -> DbResult<()>;
    async fn delete_checklist_item(&self, id: Uuid) -> DbResult<()>;

    // Assignment operations
    async fn list_assignments(&self, task_id: Uuid) -> DbResult<Vec<AssignmentView>>;
    async fn assign(&self, assignment: &NewAssignment) -> DbResult<TaskAssignment>;
    async fn unassign(&self, assignment_id: Uuid) -> DbResult<()>;
}

/// Build the backend selected by the configuration.
pub async fn init(config: &Config) -> Result<Arc<dyn Database>> {
    if config.demo {
        tracing::info!("using in-memory demo backend");
        return Ok(Arc::new(MemoryDatabase::with_demo_data()));
    }

    let db = PgDatabase::new(config).await?;
    if config.migrate {
        db.migrate().await?;
    }

    Ok(Arc::new(db))
}
