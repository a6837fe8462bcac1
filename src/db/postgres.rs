use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Database, DbResult, SessionStore};
use crate::config::Config;
use crate::error::BackendError;
use crate::models::{
    AssignedTask, AssignmentView, ChecklistItem, Column, MemberView, NewAssignment,
    NewChecklistItem, NewMember, NewProject, NewTask, Project, ProjectMember, Role, Session, Task,
    TaskAssignment, TaskView, UserProfile,
};

const PROJECT_COLUMNS: &str = "id, name, description, owner_id, is_archived, created_at";
const TASK_COLUMNS: &str = "id, project_id, title, column_id, created_by, created_at";
const ITEM_COLUMNS: &str =
    "id, task_id, title, due_date, is_completed, completed_at, position";

/// Postgres-backed implementation of [`Database`].
pub struct PgDatabase {
    pool: PgPool,
    sessions: SessionStore,
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    #[sqlx(flatten)]
    member: ProjectMember,
    profile_user_id: Option<Uuid>,
    full_name: Option<String>,
    initials: Option<String>,
    email: Option<String>,
}

#[derive(sqlx::FromRow)]
struct AssignmentRow {
    #[sqlx(flatten)]
    assignment: TaskAssignment,
    profile_user_id: Option<Uuid>,
    full_name: Option<String>,
    initials: Option<String>,
    email: Option<String>,
}

#[derive(sqlx::FromRow)]
struct AssignedTaskRow {
    #[sqlx(flatten)]
    task: Task,
    project_name: Option<String>,
}

fn joined_profile(
    user_id: Option<Uuid>,
    full_name: Option<String>,
    initials: Option<String>,
    email: Option<String>,
) -> Option<UserProfile> {
    Some(UserProfile {
        user_id: user_id?,
        full_name: full_name?,
        initials: initials?,
        email: email?,
    })
}

impl From<MemberRow> for MemberView {
    fn from(row: MemberRow) -> Self {
        MemberView {
            member: row.member,
            profile: joined_profile(row.profile_user_id, row.full_name, row.initials, row.email),
        }
    }
}

impl From<AssignmentRow> for AssignmentView {
    fn from(row: AssignmentRow) -> Self {
        AssignmentView {
            assignment: row.assignment,
            profile: joined_profile(row.profile_user_id, row.full_name, row.initials, row.email),
        }
    }
}

fn expect_affected(rows: u64) -> DbResult<()> {
    if rows == 0 {
        Err(BackendError::NotFound)
    } else {
        Ok(())
    }
}

impl PgDatabase {
    /// Create a new PgDatabase instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect(config.database_url()?)
            .await?;

        tracing::info!(max_connections = config.db_max_connections, "database pool ready");

        Ok(Self {
            pool,
            sessions: SessionStore::new(),
        })
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> DbResult<()> {
        sqlx::migrate!("./migrations").run(self.get_pool()).await?;
        tracing::info!("migrations applied");
        Ok(())
    }

    async fn checklists_for(&self, task_ids: &[Uuid]) -> DbResult<HashMap<Uuid, Vec<ChecklistItem>>> {
        let items = sqlx::query_as::<_, ChecklistItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM checklist_items WHERE task_id = ANY($1) ORDER BY position ASC"
        ))
        .bind(task_ids)
        .fetch_all(self.get_pool())
        .await?;

        let mut by_task: HashMap<Uuid, Vec<ChecklistItem>> = HashMap::new();
        for item in items {
            by_task.entry(item.task_id).or_default().push(item);
        }
        Ok(by_task)
    }

    async fn assignments_for(&self, task_ids: &[Uuid]) -> DbResult<HashMap<Uuid, Vec<AssignmentView>>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT a.id, a.task_id, a.user_id, a.assigned_by,
                   p.user_id AS profile_user_id, p.full_name, p.initials, p.email
            FROM task_assignments a
            LEFT JOIN user_profiles p ON p.user_id = a.user_id
            WHERE a.task_id = ANY($1)
            ORDER BY a.created_at ASC
            "#,
        )
        .bind(task_ids)
        .fetch_all(self.get_pool())
        .await?;

        let mut by_task: HashMap<Uuid, Vec<AssignmentView>> = HashMap::new();
        for row in rows {
            let view = AssignmentView::from(row);
            by_task.entry(view.assignment.task_id).or_default().push(view);
        }
        Ok(by_task)
    }
}

#[async_trait]
impl Database for PgDatabase {
    fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    async fn sign_in(&self, email: &str, password: &str) -> DbResult<Session> {
        let row: Option<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT id, email FROM auth_users
            WHERE email = $1 AND encrypted_password = crypt($2, encrypted_password)
            "#,
        )
        .bind(email)
        .bind(password)
        .fetch_optional(self.get_pool())
        .await?;

        let (user_id, email) = row.ok_or(BackendError::InvalidCredentials)?;
        let session = Session {
            user_id,
            email: Some(email),
        };
        self.sessions.set(Some(session.clone()));

        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> DbResult<Uuid> {
        let id: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO auth_users (email, encrypted_password)
            VALUES ($1, crypt($2, gen_salt('bf')))
            ON CONFLICT (email) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(password)
        .fetch_optional(self.get_pool())
        .await?;

        id.ok_or_else(|| BackendError::EmailTaken(email.to_string()))
    }

    async fn sign_out(&self) -> DbResult<()> {
        self.sessions.set(None);
        Ok(())
    }

    async fn get_profile(&self, user_id: Uuid) -> DbResult<UserProfile> {
        let profile = sqlx::query_as::<_, UserProfile>(
            "SELECT user_id, full_name, initials, email FROM user_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.get_pool())
        .await?;

        Ok(profile)
    }

    async fn create_profile(&self, profile: &UserProfile) -> DbResult<UserProfile> {
        let created = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles (user_id, full_name, initials, email)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, full_name, initials, email
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.full_name)
        .bind(&profile.initials)
        .bind(&profile.email)
        .fetch_one(self.get_pool())
        .await?;

        Ok(created)
    }

    async fn list_profiles(&self) -> DbResult<Vec<UserProfile>> {
        let profiles = sqlx::query_as::<_, UserProfile>(
            "SELECT user_id, full_name, initials, email FROM user_profiles ORDER BY full_name ASC",
        )
        .fetch_all(self.get_pool())
        .await?;

        Ok(profiles)
    }

    async fn list_active_projects(&self) -> DbResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE is_archived = false ORDER BY created_at DESC"
        ))
        .fetch_all(self.get_pool())
        .await?;

        Ok(projects)
    }

    async fn get_project(&self, id: Uuid) -> DbResult<Project> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(self.get_pool())
        .await?;

        Ok(project)
    }

    async fn create_project(&self, project: &NewProject) -> DbResult<Project> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects (name, description, owner_id) VALUES ($1, $2, $3) RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id, role, added_by)
            VALUES ($1, $2, $3, $2)
            "#,
        )
        .bind(created.id)
        .bind(project.owner_id)
        .bind(Role::Editor.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_membership(&self, project_id: Uuid, user_id: Uuid) -> DbResult<Option<ProjectMember>> {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT id, project_id, user_id, role, added_by
            FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(self.get_pool())
        .await?;

        Ok(member)
    }

    async fn list_members(&self, project_id: Uuid) -> DbResult<Vec<MemberView>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT m.id, m.project_id, m.user_id, m.role, m.added_by,
                   p.user_id AS profile_user_id, p.full_name, p.initials, p.email
            FROM project_members m
            LEFT JOIN user_profiles p ON p.user_id = m.user_id
            WHERE m.project_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(self.get_pool())
        .await?;

        Ok(rows.into_iter().map(MemberView::from).collect())
    }

    async fn add_member(&self, member: &NewMember) -> DbResult<ProjectMember> {
        let created = sqlx::query_as::<_, ProjectMember>(
            r#"
            INSERT INTO project_members (project_id, user_id, role, added_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, project_id, user_id, role, added_by
            "#,
        )
        .bind(member.project_id)
        .bind(member.user_id)
        .bind(member.role.as_str())
        .bind(member.added_by)
        .fetch_one(self.get_pool())
        .await?;

        Ok(created)
    }

    async fn list_tasks(&self, project_id: Uuid) -> DbResult<Vec<TaskView>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = $1 ORDER BY created_at DESC"
        ))
        .bind(project_id)
        .fetch_all(self.get_pool())
        .await?;

        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
        let mut checklists = self.checklists_for(&ids).await?;
        let mut assignments = self.assignments_for(&ids).await?;

        Ok(tasks
            .into_iter()
            .map(|task| TaskView {
                checklist: checklists.remove(&task.id).unwrap_or_default(),
                assignments: assignments.remove(&task.id).unwrap_or_default(),
                task,
            })
            .collect())
    }

    async fn get_task(&self, id: Uuid) -> DbResult<Task> {
        let task = sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_one(self.get_pool())
            .await?;

        Ok(task)
    }

    async fn create_task(&self, task: &NewTask) -> DbResult<Task> {
        let created = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (project_id, title, column_id, created_by) VALUES ($1, $2, $3, $4) RETURNING {TASK_COLUMNS}"
        ))
        .bind(task.project_id)
        .bind(&task.title)
        .bind(task.column.as_str())
        .bind(task.created_by)
        .fetch_one(self.get_pool())
        .await?;

        Ok(created)
    }

    async fn delete_task(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(self.get_pool())
            .await?;

        expect_affected(result.rows_affected())
    }

    async fn set_task_column(&self, id: Uuid, column: Column) -> DbResult<()> {
        let result = sqlx::query("UPDATE tasks SET column_id = $1 WHERE id = $2")
            .bind(column.as_str())
            .bind(id)
            .execute(self.get_pool())
            .await?;

        expect_affected(result.rows_affected())
    }

    async fn list_assigned_tasks(&self, user_id: Uuid) -> DbResult<Vec<AssignedTask>> {
        let rows = sqlx::query_as::<_, AssignedTaskRow>(
            r#"
            SELECT t.id, t.project_id, t.title, t.column_id, t.created_by, t.created_at,
                   p.name AS project_name
            FROM task_assignments a
            JOIN tasks t ON t.id = a.task_id
            LEFT JOIN projects p ON p.id = t.project_id
            WHERE a.user_id = $1
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.get_pool())
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.task.id).collect();
        let mut checklists = self.checklists_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| AssignedTask {
                checklist: checklists.remove(&row.task.id).unwrap_or_default(),
                task: row.task,
                project_name: row.project_name,
            })
            .collect())
    }

    async fn list_checklist(&self, task_id: Uuid) -> DbResult<Vec<ChecklistItem>> {
        let items = sqlx::query_as::<_, ChecklistItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM checklist_items WHERE task_id = $1 ORDER BY position ASC"
        ))
        .bind(task_id)
        .fetch_all(self.get_pool())
        .await?;

        Ok(items)
    }

    async fn add_checklist_item(&self, item: &NewChecklistItem) -> DbResult<ChecklistItem> {
        let created = sqlx::query_as::<_, ChecklistItem>(&format!(
            "INSERT INTO checklist_items (task_id, title, due_date, position) VALUES ($1, $2, $3, $4) RETURNING {ITEM_COLUMNS}"
        ))
        .bind(item.task_id)
        .bind(&item.title)
        .bind(item.due_date)
        .bind(item.position)
        .fetch_one(self.get_pool())
        .await?;

        Ok(created)
    }

    async fn set_checklist_completion(
        &self,
        id: Uuid,
        completed_at: Option<DateTime<Utc>>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE checklist_items SET is_completed = $1, completed_at = $2 WHERE id = $3",
        )
        .bind(completed_at.is_some())
        .bind(completed_at)
        .bind(id)
        .execute(self.get_pool())
        .await?;

        expect_affected(result.rows_affected())
    }

    async fn delete_checklist_item(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM checklist_items WHERE id = $1")
            .bind(id)
            .execute(self.get_pool())
            .await?;

        expect_affected(result.rows_affected())
    }

    async fn list_assignments(&self, task_id: Uuid) -> DbResult<Vec<AssignmentView>> {
        let mut by_task = self.assignments_for(&[task_id]).await?;
        Ok(by_task.remove(&task_id).unwrap_or_default())
    }

    async fn assign(&self, assignment: &NewAssignment) -> DbResult<TaskAssignment> {
        let created = sqlx::query_as::<_, TaskAssignment>(
            r#"
            INSERT INTO task_assignments (task_id, user_id, assigned_by)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, user_id, assigned_by
            "#,
        )
        .bind(assignment.task_id)
        .bind(assignment.user_id)
        .bind(assignment.assigned_by)
        .fetch_one(self.get_pool())
        .await?;

        Ok(created)
    }

    async fn unassign(&self, assignment_id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM task_assignments WHERE id = $1")
            .bind(assignment_id)
            .execute(self.get_pool())
            .await?;

        expect_affected(result.rows_affected())
    }
}
