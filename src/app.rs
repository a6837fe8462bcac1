//! Application state: the current screen, the signed-in profile and the
//! background loads feeding them.
//!
//! Reads run on spawned tasks and come back through a channel tagged with a
//! [`Ticket`]; anything whose ticket is no longer current is dropped. Writes
//! are awaited inline by the key handler, then the affected view is reloaded.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::db::Database;
use crate::error::ServiceError;
use crate::generation::{Generations, Slot, Ticket};
use crate::models::{AssignedTask, Project, Session, UserProfile};
use crate::service::board::BoardSnapshot;
use crate::service::task_detail::{TaskDetail, ToggleOutcome};
use crate::service::{self, Actor, Mutation, ServiceResult};
use crate::ui::auth_form::{self, AuthAction, AuthFormState, AuthMode};
use crate::ui::board::{self, BoardAction, BoardModal, BoardState};
use crate::ui::dashboard::{self, DashboardAction, DashboardState};
use crate::ui::invite::{self, InviteAction, InviteState};
use crate::ui::project_wizard::{self, ProjectWizardAction, ProjectWizardState};
use crate::ui::projects::{self, ProjectAction, ProjectsState};
use crate::ui::task_detail::{self, TaskDetailAction, TaskDetailState};

pub const MOVED_TO_IN_PROGRESS: &str = "Task moved to In progress";

pub enum Screen {
    Auth(AuthFormState),
    /// Waiting for the profile of a fresh session.
    Loading,
    Projects(ProjectsState),
    ProjectWizard(ProjectWizardState),
    Dashboard(DashboardState),
    Board(BoardState),
}

#[derive(Debug)]
pub enum Payload {
    Profile(UserProfile),
    Projects(Vec<Project>),
    Dashboard(Vec<AssignedTask>),
    Board(BoardSnapshot),
    TaskDetail(TaskDetail),
    Invitable(Vec<UserProfile>),
}

#[derive(Debug)]
pub struct Loaded {
    ticket: Ticket,
    result: ServiceResult<Payload>,
}

pub struct App {
    db: Arc<dyn Database>,
    sessions: watch::Receiver<Option<Session>>,
    pub profile: Option<UserProfile>,
    pub screen: Screen,
    pub alert: Option<String>,
    generations: Generations,
    loads_tx: mpsc::UnboundedSender<Loaded>,
    loads_rx: mpsc::UnboundedReceiver<Loaded>,
    pub should_quit: bool,
}

impl App {
    /// Must be called inside a tokio runtime: an existing session starts
    /// loading its profile right away.
    pub fn new(db: Arc<dyn Database>) -> Self {
        let mut sessions = db.subscribe();
        let session = sessions.borrow_and_update().clone();
        let (loads_tx, loads_rx) = mpsc::unbounded_channel();

        let mut app = Self {
            db,
            sessions,
            profile: None,
            screen: Screen::Auth(AuthFormState::new()),
            alert: None,
            generations: Generations::new(),
            loads_tx,
            loads_rx,
            should_quit: false,
        };
        app.on_session(session);
        app
    }

    /// Applies a session change published since the last call.
    pub fn sync_session(&mut self) {
        if !self.sessions.has_changed().unwrap_or(false) {
            return;
        }
        let session = self.sessions.borrow_and_update().clone();
        self.on_session(session);
    }

    fn on_session(&mut self, session: Option<Session>) {
        match session {
            Some(session) => {
                if self.profile.as_ref().is_some_and(|p| p.user_id == session.user_id) {
                    return;
                }
                tracing::debug!(user_id = %session.user_id, "session started, resolving profile");
                self.set_screen(Screen::Loading);
                let db = self.db.clone();
                self.spawn_load(Slot::Session, async move {
                    service::session::resolve_profile(db.as_ref(), &session)
                        .await
                        .map(Payload::Profile)
                });
            }
            None => {
                self.profile = None;
                self.generations.invalidate(Slot::Session);
                if !matches!(self.screen, Screen::Auth(_)) {
                    self.set_screen(Screen::Auth(AuthFormState::new()));
                }
            }
        }
    }

    fn spawn_load<F>(&mut self, slot: Slot, load: F)
    where
        F: Future<Output = ServiceResult<Payload>> + Send + 'static,
    {
        let ticket = self.generations.issue(slot);
        let tx = self.loads_tx.clone();
        tokio::spawn(async move {
            let result = load.await;
            // The receiver lives as long as the app; a send error only happens on shutdown.
            let _ = tx.send(Loaded { ticket, result });
        });
    }

    /// Applies every load that has already finished.
    pub fn drain_loads(&mut self) {
        while let Ok(loaded) = self.loads_rx.try_recv() {
            self.apply(loaded);
        }
    }

    /// Waits for the next finished load and applies it. Returns whether it
    /// was current.
    pub async fn next_load(&mut self) -> bool {
        match self.loads_rx.recv().await {
            Some(loaded) => self.apply(loaded),
            None => false,
        }
    }

    fn apply(&mut self, loaded: Loaded) -> bool {
        if !self.generations.is_current(loaded.ticket) {
            tracing::debug!(slot = ?loaded.ticket.slot(), "discarding stale load");
            return false;
        }

        match loaded.result {
            Ok(payload) => self.install(payload),
            Err(err) if loaded.ticket.slot() == Slot::Session => {
                tracing::error!(error = %err, "could not resolve profile");
                self.set_screen(Screen::Auth(AuthFormState::with_error(err.to_string())));
            }
            Err(err) => {
                tracing::error!(error = %err, slot = ?loaded.ticket.slot(), "load failed");
                self.alert = Some(err.to_string());
            }
        }
        true
    }

    fn install(&mut self, payload: Payload) {
        let payload = match payload {
            Payload::Profile(profile) => {
                tracing::info!(user_id = %profile.user_id, "profile ready");
                self.profile = Some(profile);
                self.open_projects();
                return;
            }
            other => other,
        };

        match (payload, &mut self.screen) {
            (Payload::Projects(list), Screen::Projects(state)) => state.set_projects(list),
            (Payload::Dashboard(tasks), Screen::Dashboard(state)) => state.set_tasks(tasks),
            (Payload::Board(snapshot), Screen::Board(state)) if state.project_id == snapshot.project.id => {
                state.set_snapshot(snapshot)
            }
            (Payload::TaskDetail(detail), Screen::Board(state)) => {
                if let Some(BoardModal::Detail(modal)) = &mut state.modal {
                    if modal.task_id == detail.task.id {
                        modal.set_detail(detail);
                    }
                }
            }
            (Payload::Invitable(users), Screen::Board(state)) => {
                if let Some(BoardModal::Invite(modal)) = &mut state.modal {
                    modal.set_users(users);
                }
            }
            (payload, _) => tracing::debug!(?payload, "load does not match the current screen"),
        }
    }

    fn set_screen(&mut self, screen: Screen) {
        self.generations.invalidate(Slot::Screen);
        self.generations.invalidate(Slot::Modal);
        self.screen = screen;
    }

    fn user_id(&self) -> ServiceResult<Uuid> {
        self.profile.as_ref().map(|p| p.user_id).ok_or(ServiceError::NotSignedIn)
    }

    pub fn open_projects(&mut self) {
        self.set_screen(Screen::Projects(ProjectsState::loading()));
        let db = self.db.clone();
        self.spawn_load(Slot::Screen, async move {
            service::projects::load_projects(db.as_ref())
                .await
                .map(Payload::Projects)
        });
    }

    fn open_dashboard(&mut self) {
        let Ok(user_id) = self.user_id() else {
            return;
        };
        self.set_screen(Screen::Dashboard(DashboardState::loading()));
        let db = self.db.clone();
        self.spawn_load(Slot::Screen, async move {
            service::dashboard::load_my_tasks(db.as_ref(), user_id)
                .await
                .map(Payload::Dashboard)
        });
    }

    fn open_board(&mut self, project_id: Uuid) {
        self.set_screen(Screen::Board(BoardState::loading(project_id)));
        self.reload_board();
    }

    fn reload_board(&mut self) {
        let Screen::Board(state) = &self.screen else {
            return;
        };
        let project_id = state.project_id;
        let Ok(user_id) = self.user_id() else {
            return;
        };
        let db = self.db.clone();
        self.spawn_load(Slot::Screen, async move {
            service::board::load_board(db.as_ref(), project_id, user_id)
                .await
                .map(Payload::Board)
        });
    }

    fn open_modal(&mut self, modal: BoardModal) {
        let Screen::Board(state) = &mut self.screen else {
            return;
        };
        let db = self.db.clone();
        let load = match &modal {
            BoardModal::Detail(detail) => {
                let task_id = detail.task_id;
                ModalLoad::Detail(task_id)
            }
            BoardModal::Invite(_) => ModalLoad::Invitable(state.project_id),
        };
        state.modal = Some(modal);
        self.spawn_load(Slot::Modal, async move {
            match load {
                ModalLoad::Detail(task_id) => service::task_detail::load_task_detail(db.as_ref(), task_id)
                    .await
                    .map(Payload::TaskDetail),
                ModalLoad::Invitable(project_id) => service::invite::load_invitable(db.as_ref(), project_id)
                    .await
                    .map(Payload::Invitable),
            }
        });
    }

    fn reload_detail(&mut self) {
        let Screen::Board(BoardState {
            modal: Some(BoardModal::Detail(detail)),
            ..
        }) = &self.screen
        else {
            return;
        };
        let task_id = detail.task_id;
        let db = self.db.clone();
        self.spawn_load(Slot::Modal, async move {
            service::task_detail::load_task_detail(db.as_ref(), task_id)
                .await
                .map(Payload::TaskDetail)
        });
    }

    fn close_modal(&mut self) {
        self.generations.invalidate(Slot::Modal);
        if let Screen::Board(state) = &mut self.screen {
            state.modal = None;
        }
    }

    /// The acting user on the open board, once its snapshot is loaded.
    fn board_actor(&self) -> Option<(Uuid, Actor)> {
        let Screen::Board(state) = &self.screen else {
            return None;
        };
        let snapshot = state.snapshot.as_ref()?;
        let user_id = self.profile.as_ref()?.user_id;
        Some((state.project_id, snapshot.actor(user_id)))
    }

    /// Shows an error or triggers reloads after a write.
    fn after_write(&mut self, result: ServiceResult<Mutation>, reload_detail: bool) {
        match result {
            Ok(Mutation::Applied) => {
                self.reload_board();
                if reload_detail {
                    self.reload_detail();
                }
            }
            Ok(Mutation::ReadOnly) => {}
            Err(err) => {
                tracing::error!(error = %err, "write failed");
                self.alert = Some(err.to_string());
            }
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.alert.take().is_some() {
            return;
        }

        let code = key.code;
        match &mut self.screen {
            Screen::Auth(form) => {
                if let Some(action) = auth_form::handle_key(form, code) {
                    self.on_auth(action).await;
                }
            }
            Screen::Loading => {
                if code == KeyCode::Esc {
                    self.should_quit = true;
                }
            }
            Screen::Projects(state) => {
                if let Some(action) = projects::handle_key(state, code) {
                    self.on_projects(action).await;
                }
            }
            Screen::ProjectWizard(state) => {
                if let Some(action) = project_wizard::handle_key(state, code) {
                    self.on_project_wizard(action).await;
                }
            }
            Screen::Dashboard(state) => match dashboard::handle_key(state, code) {
                Some(DashboardAction::Back) => self.open_projects(),
                Some(DashboardAction::Reload) => self.open_dashboard(),
                Some(DashboardAction::OpenProject(project_id)) => self.open_board(project_id),
                None => {}
            },
            Screen::Board(state) => match &mut state.modal {
                Some(BoardModal::Detail(detail)) => {
                    if let Some(action) = task_detail::handle_key(detail, code) {
                        self.on_task_detail(action).await;
                    }
                }
                Some(BoardModal::Invite(modal)) => {
                    if let Some(action) = invite::handle_key(modal, code) {
                        self.on_invite(action).await;
                    }
                }
                None => {
                    if let Some(action) = board::handle_key(state, code) {
                        self.on_board(action).await;
                    }
                }
            },
        }
    }

    async fn on_auth(&mut self, action: AuthAction) {
        let AuthAction::Submit { mode, email, password } = action else {
            self.should_quit = true;
            return;
        };

        let result = match mode {
            AuthMode::Login => service::session::sign_in(self.db.as_ref(), &email, &password)
                .await
                .map(|_| ()),
            AuthMode::SignUp => service::session::sign_up(self.db.as_ref(), &email, &password).await,
        };

        let Screen::Auth(form) = &mut self.screen else {
            return;
        };
        match (result, mode) {
            // The session watch moves the app on from here.
            (Ok(()), AuthMode::Login) => form.busy = false,
            (Ok(()), AuthMode::SignUp) => form.signed_up(),
            (Err(err), _) => {
                tracing::warn!(error = %err, "authentication failed");
                form.failed(err.to_string());
            }
        }
    }

    async fn on_projects(&mut self, action: ProjectAction) {
        match action {
            ProjectAction::OpenDashboard => self.open_dashboard(),
            ProjectAction::OpenProject(project_id) => self.open_board(project_id),
            ProjectAction::NewProject => self.set_screen(Screen::ProjectWizard(ProjectWizardState::new())),
            ProjectAction::Logout => {
                if let Err(err) = service::session::sign_out(self.db.as_ref()).await {
                    tracing::error!(error = %err, "sign out failed");
                    self.alert = Some(err.to_string());
                }
            }
            ProjectAction::Quit => self.should_quit = true,
        }
    }

    async fn on_project_wizard(&mut self, action: ProjectWizardAction) {
        let ProjectWizardAction::Save { name, description } = action else {
            self.open_projects();
            return;
        };

        let result = match self.user_id() {
            Ok(owner) => service::projects::create_project(self.db.as_ref(), owner, &name, &description).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(_) => self.open_projects(),
            Err(err) => {
                if let Screen::ProjectWizard(state) = &mut self.screen {
                    state.failed(err.to_string());
                }
            }
        }
    }

    async fn on_board(&mut self, action: BoardAction) {
        let db = self.db.clone();
        match action {
            BoardAction::Back => self.open_projects(),
            BoardAction::Reload => self.reload_board(),
            BoardAction::OpenTask(task_id) => {
                let can_edit = self.board_actor().is_some_and(|(_, actor)| actor.can_edit());
                self.open_modal(BoardModal::Detail(TaskDetailState::loading(task_id, can_edit)));
            }
            BoardAction::Invite => self.open_modal(BoardModal::Invite(InviteState::loading())),
            action => {
                let Some((project_id, actor)) = self.board_actor() else {
                    return;
                };
                let result = match action {
                    BoardAction::AddTask { column, title } => {
                        service::board::add_task(db.as_ref(), &actor, project_id, column, &title).await
                    }
                    BoardAction::DeleteTask(task_id) => service::board::delete_task(db.as_ref(), &actor, task_id).await,
                    BoardAction::MoveTask { task_id, to } => {
                        service::board::move_task(db.as_ref(), &actor, task_id, to).await
                    }
                    _ => return,
                };
                self.after_write(result, false);
            }
        }
    }

    async fn on_task_detail(&mut self, action: TaskDetailAction) {
        if action == TaskDetailAction::Close {
            self.close_modal();
            self.reload_board();
            return;
        }

        let Some((_, actor)) = self.board_actor() else {
            return;
        };
        let Screen::Board(BoardState {
            modal: Some(BoardModal::Detail(detail)),
            ..
        }) = &self.screen
        else {
            return;
        };
        let task_id = detail.task_id;
        let task = detail.detail.as_ref().map(|d| d.task.clone());
        let db = self.db.clone();
        let db = db.as_ref();

        let result = match action {
            TaskDetailAction::Toggle(item) => {
                let Some(task) = task else {
                    return;
                };
                match service::task_detail::toggle_item(db, &actor, &task, &item, Utc::now()).await {
                    Ok(ToggleOutcome::ReadOnly) => Ok(Mutation::ReadOnly),
                    Ok(ToggleOutcome::Toggled { .. }) => Ok(Mutation::Applied),
                    Ok(ToggleOutcome::MovedToInProgress) => {
                        self.close_modal();
                        self.reload_board();
                        self.alert = Some(MOVED_TO_IN_PROGRESS.to_string());
                        return;
                    }
                    Err(err) => {
                        // The completion can be stored even when the move that follows fails.
                        self.reload_board();
                        self.reload_detail();
                        Err(err)
                    }
                }
            }
            TaskDetailAction::AddItem { title, due_date } => {
                service::task_detail::add_item(db, &actor, task_id, &title, due_date).await
            }
            TaskDetailAction::DeleteItem(item_id) => service::task_detail::delete_item(db, &actor, item_id).await,
            TaskDetailAction::Assign(user_id) => service::task_detail::assign_user(db, &actor, task_id, user_id).await,
            TaskDetailAction::Unassign(assignment_id) => {
                service::task_detail::unassign_user(db, &actor, assignment_id).await
            }
            TaskDetailAction::Close => return,
        };
        self.after_write(result, true);
    }

    async fn on_invite(&mut self, action: InviteAction) {
        let InviteAction::Invite { user_id, role } = action else {
            self.close_modal();
            return;
        };
        let Some((project_id, actor)) = self.board_actor() else {
            return;
        };

        let result = service::invite::invite_member(self.db.as_ref(), &actor, project_id, user_id, role).await;
        if matches!(result, Ok(Mutation::Applied)) {
            self.close_modal();
        }
        self.after_write(result, false);
    }
}

enum ModalLoad {
    Detail(Uuid),
    Invitable(Uuid),
}
