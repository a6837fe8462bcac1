use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Database, DbResult, SessionStore};
use crate::error::BackendError;
use crate::models::{
    AssignedTask, AssignmentView, ChecklistItem, Column, MemberView, NewAssignment,
    NewChecklistItem, NewMember, NewProject, NewTask, Project, ProjectMember, Role, Session, Task,
    TaskAssignment, TaskView, UserProfile,
};

/// Demo accounts seeded by [`MemoryDatabase::with_demo_data`]. All share one password.
pub const DEMO_ACCOUNTS: [&str; 3] = ["ana@example.com", "bogdan@example.com", "carmen@example.com"];
pub const DEMO_PASSWORD: &str = "taskboard";

struct Account {
    id: Uuid,
    email: String,
    password: String,
}

#[derive(Default)]
struct Tables {
    accounts: Vec<Account>,
    profiles: Vec<UserProfile>,
    projects: Vec<Project>,
    members: Vec<ProjectMember>,
    tasks: Vec<Task>,
    items: Vec<ChecklistItem>,
    assignments: Vec<TaskAssignment>,
}

impl Tables {
    fn profile(&self, user_id: Uuid) -> Option<UserProfile> {
        self.profiles.iter().find(|p| p.user_id == user_id).cloned()
    }

    fn checklist(&self, task_id: Uuid) -> Vec<ChecklistItem> {
        let mut items: Vec<ChecklistItem> = self
            .items
            .iter()
            .filter(|i| i.task_id == task_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.position);
        items
    }

    fn assignment_views(&self, task_id: Uuid) -> Vec<AssignmentView> {
        self.assignments
            .iter()
            .filter(|a| a.task_id == task_id)
            .map(|a| AssignmentView {
                assignment: a.clone(),
                profile: self.profile(a.user_id),
            })
            .collect()
    }
}

/// Newest first; rows created at the same instant keep reverse insertion order.
fn newest_first<T: Clone>(rows: &[T], created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut rows: Vec<T> = rows.iter().rev().cloned().collect();
    rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    rows
}

/// In-process implementation of [`Database`] with the same observable
/// behavior as the Postgres backend. Every write bumps a counter so tests can
/// assert that read-only paths never reach the backend.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: Mutex<Tables>,
    sessions: SessionStore,
    writes: AtomicUsize,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend with the demo accounts registered and their profiles created.
    pub fn with_demo_data() -> Self {
        let db = Self::new();
        {
            let mut tables = db.lock();
            for email in DEMO_ACCOUNTS {
                let id = Uuid::new_v4();
                tables.accounts.push(Account {
                    id,
                    email: email.to_string(),
                    password: DEMO_PASSWORD.to_string(),
                });
                tables.profiles.push(UserProfile::synthesize(id, Some(email)));
            }
        }
        db
    }

    /// Number of write operations issued so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Inserts a task row without validating its column identifier, mimicking
    /// rows written by other clients of the shared backend.
    pub fn insert_raw_task(&self, project_id: Uuid, title: &str, column_id: &str) -> Task {
        let task = Task {
            id: Uuid::new_v4(),
            project_id,
            title: title.to_string(),
            column_id: column_id.to_string(),
            created_by: None,
            created_at: Utc::now(),
        };
        self.lock().tasks.push(task.clone());
        task
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> MutexGuard<'_, Tables> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.lock()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    async fn sign_in(&self, email: &str, password: &str) -> DbResult<Session> {
        let session = {
            let tables = self.lock();
            let account = tables
                .accounts
                .iter()
                .find(|a| a.email == email && a.password == password)
                .ok_or(BackendError::InvalidCredentials)?;
            Session {
                user_id: account.id,
                email: Some(account.email.clone()),
            }
        };
        self.sessions.set(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> DbResult<Uuid> {
        let mut tables = self.write();
        if tables.accounts.iter().any(|a| a.email == email) {
            return Err(BackendError::EmailTaken(email.to_string()));
        }
        let id = Uuid::new_v4();
        tables.accounts.push(Account {
            id,
            email: email.to_string(),
            password: password.to_string(),
        });
        Ok(id)
    }

    async fn sign_out(&self) -> DbResult<()> {
        self.sessions.set(None);
        Ok(())
    }

    async fn get_profile(&self, user_id: Uuid) -> DbResult<UserProfile> {
        self.lock().profile(user_id).ok_or(BackendError::NotFound)
    }

    async fn create_profile(&self, profile: &UserProfile) -> DbResult<UserProfile> {
        let mut tables = self.write();
        tables.profiles.retain(|p| p.user_id != profile.user_id);
        tables.profiles.push(profile.clone());
        Ok(profile.clone())
    }

    async fn list_profiles(&self) -> DbResult<Vec<UserProfile>> {
        let mut profiles = self.lock().profiles.clone();
        profiles.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(profiles)
    }

    async fn list_active_projects(&self) -> DbResult<Vec<Project>> {
        let tables = self.lock();
        let active: Vec<Project> = tables.projects.iter().filter(|p| !p.is_archived).cloned().collect();
        Ok(newest_first(&active, |p| p.created_at))
    }

    async fn get_project(&self, id: Uuid) -> DbResult<Project> {
        self.lock()
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    async fn create_project(&self, project: &NewProject) -> DbResult<Project> {
        let mut tables = self.write();
        let created = Project {
            id: Uuid::new_v4(),
            name: project.name.clone(),
            description: project.description.clone(),
            owner_id: project.owner_id,
            is_archived: false,
            created_at: Utc::now(),
        };
        tables.projects.push(created.clone());
        tables.members.push(ProjectMember {
            id: Uuid::new_v4(),
            project_id: created.id,
            user_id: project.owner_id,
            role: Role::Editor.as_str().to_string(),
            added_by: Some(project.owner_id),
        });
        Ok(created)
    }

    async fn get_membership(&self, project_id: Uuid, user_id: Uuid) -> DbResult<Option<ProjectMember>> {
        Ok(self
            .lock()
            .members
            .iter()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_members(&self, project_id: Uuid) -> DbResult<Vec<MemberView>> {
        let tables = self.lock();
        Ok(tables
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .map(|m| MemberView {
                member: m.clone(),
                profile: tables.profile(m.user_id),
            })
            .collect())
    }

    async fn add_member(&self, member: &NewMember) -> DbResult<ProjectMember> {
        let mut tables = self.write();
        if tables
            .members
            .iter()
            .any(|m| m.project_id == member.project_id && m.user_id == member.user_id)
        {
            return Err(BackendError::Conflict);
        }
        let created = ProjectMember {
            id: Uuid::new_v4(),
            project_id: member.project_id,
            user_id: member.user_id,
            role: member.role.as_str().to_string(),
            added_by: Some(member.added_by),
        };
        tables.members.push(created.clone());
        Ok(created)
    }

    async fn list_tasks(&self, project_id: Uuid) -> DbResult<Vec<TaskView>> {
        let tables = self.lock();
        let tasks: Vec<Task> = tables.tasks.iter().filter(|t| t.project_id == project_id).cloned().collect();
        Ok(newest_first(&tasks, |t| t.created_at)
            .into_iter()
            .map(|task| TaskView {
                checklist: tables.checklist(task.id),
                assignments: tables.assignment_views(task.id),
                task,
            })
            .collect())
    }

    async fn get_task(&self, id: Uuid) -> DbResult<Task> {
        self.lock()
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    async fn create_task(&self, task: &NewTask) -> DbResult<Task> {
        let created = Task {
            id: Uuid::new_v4(),
            project_id: task.project_id,
            title: task.title.clone(),
            column_id: task.column.as_str().to_string(),
            created_by: Some(task.created_by),
            created_at: Utc::now(),
        };
        self.write().tasks.push(created.clone());
        Ok(created)
    }

    async fn delete_task(&self, id: Uuid) -> DbResult<()> {
        let mut tables = self.write();
        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.id != id);
        if tables.tasks.len() == before {
            return Err(BackendError::NotFound);
        }
        tables.items.retain(|i| i.task_id != id);
        tables.assignments.retain(|a| a.task_id != id);
        Ok(())
    }

    async fn set_task_column(&self, id: Uuid, column: Column) -> DbResult<()> {
        let mut tables = self.write();
        let task = tables.tasks.iter_mut().find(|t| t.id == id).ok_or(BackendError::NotFound)?;
        task.column_id = column.as_str().to_string();
        Ok(())
    }

    async fn list_assigned_tasks(&self, user_id: Uuid) -> DbResult<Vec<AssignedTask>> {
        let tables = self.lock();
        let tasks: Vec<Task> = tables
            .tasks
            .iter()
            .filter(|t| tables.assignments.iter().any(|a| a.task_id == t.id && a.user_id == user_id))
            .cloned()
            .collect();
        Ok(newest_first(&tasks, |t| t.created_at)
            .into_iter()
            .map(|task| AssignedTask {
                project_name: tables
                    .projects
                    .iter()
                    .find(|p| p.id == task.project_id)
                    .map(|p| p.name.clone()),
                checklist: tables.checklist(task.id),
                task,
            })
            .collect())
    }

    async fn list_checklist(&self, task_id: Uuid) -> DbResult<Vec<ChecklistItem>> {
        Ok(self.lock().checklist(task_id))
    }

    async fn add_checklist_item(&self, item: &NewChecklistItem) -> DbResult<ChecklistItem> {
        let created = ChecklistItem {
            id: Uuid::new_v4(),
            task_id: item.task_id,
            title: item.title.clone(),
            due_date: item.due_date,
            is_completed: false,
            completed_at: None,
            position: item.position,
        };
        self.write().items.push(created.clone());
        Ok(created)
    }

    async fn set_checklist_completion(
        &self,
        id: Uuid,
        completed_at: Option<DateTime<Utc>>,
    ) -> DbResult<()> {
        let mut tables = self.write();
        let item = tables.items.iter_mut().find(|i| i.id == id).ok_or(BackendError::NotFound)?;
        item.is_completed = completed_at.is_some();
        item.completed_at = completed_at;
        Ok(())
    }

    async fn delete_checklist_item(&self, id: Uuid) -> DbResult<()> {
        let mut tables = self.write();
        let before = tables.items.len();
        tables.items.retain(|i| i.id != id);
        if tables.items.len() == before {
            return Err(BackendError::NotFound);
        }
        Ok(())
    }

    async fn list_assignments(&self, task_id: Uuid) -> DbResult<Vec<AssignmentView>> {
        Ok(self.lock().assignment_views(task_id))
    }

    async fn assign(&self, assignment: &NewAssignment) -> DbResult<TaskAssignment> {
        let mut tables = self.write();
        if tables
            .assignments
            .iter()
            .any(|a| a.task_id == assignment.task_id && a.user_id == assignment.user_id)
        {
            return Err(BackendError::Conflict);
        }
        let created = TaskAssignment {
            id: Uuid::new_v4(),
            task_id: assignment.task_id,
            user_id: assignment.user_id,
            assigned_by: Some(assignment.assigned_by),
        };
        tables.assignments.push(created.clone());
        Ok(created)
    }

    async fn unassign(&self, assignment_id: Uuid) -> DbResult<()> {
        let mut tables = self.write();
        let before = tables.assignments.len();
        tables.assignments.retain(|a| a.id != assignment_id);
        if tables.assignments.len() == before {
            return Err(BackendError::NotFound);
        }
        Ok(())
    }
}
