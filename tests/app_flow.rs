use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use uuid::Uuid;

use taskboard::app::{App, Screen, MOVED_TO_IN_PROGRESS};
use taskboard::db::{Database, DbResult, MemoryDatabase, SessionStore};
use taskboard::error::BackendError;
use taskboard::models::{
    AssignedTask, AssignmentView, ChecklistItem, Column, MemberView, NewAssignment, NewChecklistItem, NewMember,
    NewProject, NewTask, Project, ProjectMember, Role, Session, Task, TaskAssignment, TaskView, UserProfile,
};
use taskboard::service::session::sign_up;
use taskboard::ui::board::{BoardModal, BoardState};

/// In-memory backend whose task moves always fail.
struct StuckColumns {
    inner: MemoryDatabase,
}

#[async_trait]
impl Database for StuckColumns {
    fn sessions(&self) -> &SessionStore {
        self.inner.sessions()
    }

    async fn sign_in(&self, email: &str, password: &str) -> DbResult<Session> {
        self.inner.sign_in(email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> DbResult<Uuid> {
        self.inner.sign_up(email, password).await
    }

    async fn sign_out(&self) -> DbResult<()> {
        self.inner.sign_out().await
    }

    async fn get_profile(&self, user_id: Uuid) -> DbResult<UserProfile> {
        self.inner.get_profile(user_id).await
    }

    async fn create_profile(&self, profile: &UserProfile) -> DbResult<UserProfile> {
        self.inner.create_profile(profile).await
    }

    async fn list_profiles(&self) -> DbResult<Vec<UserProfile>> {
        self.inner.list_profiles().await
    }

    async fn list_active_projects(&self) -> DbResult<Vec<Project>> {
        self.inner.list_active_projects().await
    }

    async fn get_project(&self, id: Uuid) -> DbResult<Project> {
        self.inner.get_project(id).await
    }

    async fn create_project(&self, project: &NewProject) -> DbResult<Project> {
        self.inner.create_project(project).await
    }

    async fn get_membership(&self, project_id: Uuid, user_id: Uuid) -> DbResult<Option<ProjectMember>> {
        self.inner.get_membership(project_id, user_id).await
    }

    async fn list_members(&self, project_id: Uuid) -> DbResult<Vec<MemberView>> {
        self.inner.list_members(project_id).await
    }

    async fn add_member(&self, member: &NewMember) -> DbResult<ProjectMember> {
        self.inner.add_member(member).await
    }

    async fn list_tasks(&self, project_id: Uuid) -> DbResult<Vec<TaskView>> {
        self.inner.list_tasks(project_id).await
    }

    async fn get_task(&self, id: Uuid) -> DbResult<Task> {
        self.inner.get_task(id).await
    }

    async fn create_task(&self, task: &NewTask) -> DbResult<Task> {
        self.inner.create_task(task).await
    }

    async fn delete_task(&self, id: Uuid) -> DbResult<()> {
        self.inner.delete_task(id).await
    }

    async fn set_task_column(&self, _id: Uuid, _column: Column) -> DbResult<()> {
        Err(BackendError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn list_assigned_tasks(&self, user_id: Uuid) -> DbResult<Vec<AssignedTask>> {
        self.inner.list_assigned_tasks(user_id).await
    }

    async fn list_checklist(&self, task_id: Uuid) -> DbResult<Vec<ChecklistItem>> {
        self.inner.list_checklist(task_id).await
    }

    async fn add_checklist_item(&self, item: &NewChecklistItem) -> DbResult<ChecklistItem> {
        self.inner.add_checklist_item(item).await
    }

    async fn set_checklist_completion(&self, id: Uuid, completed_at: Option<DateTime<Utc>>) -> DbResult<()> {
        self.inner.set_checklist_completion(id, completed_at).await
    }

    async fn delete_checklist_item(&self, id: Uuid) -> DbResult<()> {
        self.inner.delete_checklist_item(id).await
    }

    async fn list_assignments(&self, task_id: Uuid) -> DbResult<Vec<AssignmentView>> {
        self.inner.list_assignments(task_id).await
    }

    async fn assign(&self, assignment: &NewAssignment) -> DbResult<TaskAssignment> {
        self.inner.assign(assignment).await
    }

    async fn unassign(&self, assignment_id: Uuid) -> DbResult<()> {
        self.inner.unassign(assignment_id).await
    }
}

async fn press(app: &mut App, code: KeyCode) {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).await;
}

async fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        press(app, KeyCode::Char(c)).await;
    }
}

/// Signs in through the auth form and waits for the project list.
async fn signed_in_app(db: Arc<dyn Database>) -> App {
    sign_up(&*db, "ana@example.com", "secret1").await.unwrap();

    let mut app = App::new(db);
    assert!(matches!(app.screen, Screen::Auth(_)));
    type_text(&mut app, "ana@example.com").await;
    press(&mut app, KeyCode::Tab).await;
    type_text(&mut app, "secret1").await;
    press(&mut app, KeyCode::Enter).await;

    app.sync_session();
    assert!(matches!(app.screen, Screen::Loading));
    assert!(app.next_load().await, "profile load");
    assert!(app.next_load().await, "project list load");
    assert_eq!(app.profile.as_ref().map(|p| p.initials.as_str()), Some("AN"));
    app
}

fn board_state(app: &App) -> &BoardState {
    match &app.screen {
        Screen::Board(state) => state,
        _ => panic!("expected the board screen"),
    }
}

#[tokio::test]
async fn wrong_password_stays_on_the_form() {
    let db = Arc::new(MemoryDatabase::new());
    sign_up(&*db, "ana@example.com", "secret1").await.unwrap();

    let mut app = App::new(db);
    type_text(&mut app, "ana@example.com").await;
    press(&mut app, KeyCode::Tab).await;
    type_text(&mut app, "secret2").await;
    press(&mut app, KeyCode::Enter).await;
    app.sync_session();

    match &app.screen {
        Screen::Auth(form) => {
            assert_eq!(form.error.as_deref(), Some("invalid email or password"));
            assert!(!form.busy);
        }
        _ => panic!("expected the auth form"),
    }
}

/// Creates a project with one todo task holding a single checklist item and
/// leaves that task's detail open.
async fn open_task_with_one_item(app: &mut App) {
    press(app, KeyCode::Char('n')).await;
    type_text(app, "Launch").await;
    press(app, KeyCode::Enter).await;
    press(app, KeyCode::Char('s')).await;
    assert!(app.next_load().await);

    press(app, KeyCode::Down).await;
    press(app, KeyCode::Enter).await;
    assert!(app.next_load().await);
    let snapshot = board_state(app).snapshot.as_ref().unwrap();
    assert_eq!(snapshot.project.name, "Launch");
    assert_eq!(snapshot.role, Role::Editor);

    press(app, KeyCode::Char('a')).await;
    type_text(app, "Ship").await;
    press(app, KeyCode::Enter).await;
    assert!(app.next_load().await);
    assert_eq!(board_state(app).snapshot.as_ref().unwrap().board.column(Column::Todo).len(), 1);

    press(app, KeyCode::Enter).await;
    assert!(app.next_load().await);
    press(app, KeyCode::Char('a')).await;
    type_text(app, "one").await;
    press(app, KeyCode::Enter).await;
    assert!(app.next_load().await);
    assert!(app.next_load().await);
}

#[tokio::test]
async fn first_checklist_completion_moves_the_card() {
    let db = Arc::new(MemoryDatabase::new());
    let mut app = signed_in_app(db).await;
    open_task_with_one_item(&mut app).await;

    press(&mut app, KeyCode::Char(' ')).await;
    assert_eq!(app.alert.as_deref(), Some(MOVED_TO_IN_PROGRESS));
    assert!(board_state(&app).modal.is_none());
    assert!(app.next_load().await);

    let board = &board_state(&app).snapshot.as_ref().unwrap().board;
    assert!(board.column(Column::Todo).is_empty());
    assert_eq!(board.column(Column::InProgress)[0].task.title, "Ship");

    // Any key dismisses the notice without acting on it.
    press(&mut app, KeyCode::Esc).await;
    assert!(app.alert.is_none());
    assert!(matches!(app.screen, Screen::Board(_)));
}

#[tokio::test]
async fn failed_move_after_completion_shows_the_stored_state() {
    let db = Arc::new(StuckColumns {
        inner: MemoryDatabase::new(),
    });
    let mut app = signed_in_app(db).await;
    open_task_with_one_item(&mut app).await;

    press(&mut app, KeyCode::Char(' ')).await;
    let alert = app.alert.clone().unwrap();
    assert!(alert.starts_with("database error"), "{alert}");
    assert!(app.next_load().await);
    assert!(app.next_load().await);

    let state = board_state(&app);
    let card = &state.snapshot.as_ref().unwrap().board.column(Column::Todo)[0];
    assert!(card.checklist[0].is_completed);
    match &state.modal {
        Some(BoardModal::Detail(modal)) => {
            let detail = modal.detail.as_ref().unwrap();
            assert!(detail.checklist[0].is_completed);
        }
        _ => panic!("expected the task detail to stay open"),
    }
}

#[tokio::test]
async fn leaving_a_board_discards_its_pending_load() {
    let db = Arc::new(MemoryDatabase::new());
    let mut app = signed_in_app(db).await;
    press(&mut app, KeyCode::Char('n')).await;
    type_text(&mut app, "Launch").await;
    press(&mut app, KeyCode::Enter).await;
    press(&mut app, KeyCode::Char('s')).await;
    assert!(app.next_load().await);

    press(&mut app, KeyCode::Down).await;
    press(&mut app, KeyCode::Enter).await;
    press(&mut app, KeyCode::Esc).await;

    let applied = [app.next_load().await, app.next_load().await];
    assert_eq!(applied.iter().filter(|current| **current).count(), 1);
    match &app.screen {
        Screen::Projects(state) => assert!(!state.is_loading()),
        _ => panic!("expected the project list"),
    }
}

#[tokio::test]
async fn logging_out_returns_to_the_form() {
    let db = Arc::new(MemoryDatabase::new());
    let mut app = signed_in_app(db).await;

    press(&mut app, KeyCode::Char('l')).await;
    app.sync_session();
    assert!(matches!(app.screen, Screen::Auth(_)));
    assert!(app.profile.is_none());
}
