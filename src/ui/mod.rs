pub mod auth_form;
pub mod board;
pub mod components;
pub mod dashboard;
pub mod invite;
pub mod project_wizard;
pub mod projects;
pub mod task_detail;

use chrono::Utc;
use tui::{
    backend::Backend,
    layout::Alignment,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, Screen};
use crate::ui::components::popup::render_alert;

/// Renders the current screen and, on top of it, any pending alert.
pub fn draw<B: Backend>(f: &mut Frame<B>, app: &mut App) {
    let now = Utc::now();
    let profile = app.profile.as_ref();

    match &mut app.screen {
        Screen::Auth(state) => auth_form::render_auth_form(f, state),
        Screen::Loading => {
            let loading = Paragraph::new("Loading your profile...")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Task Board"));
            f.render_widget(loading, f.size());
        }
        Screen::Projects(state) => projects::render_projects(f, state, profile),
        Screen::ProjectWizard(state) => project_wizard::render_project_wizard(f, state),
        Screen::Dashboard(state) => dashboard::render_dashboard(f, state, now),
        Screen::Board(state) => board::render_board(f, state, now),
    }

    if let Some(message) = &app.alert {
        render_alert(f, message);
    }
}
