use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::ui::components::popup::centered_rect;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AuthMode {
    Login,
    SignUp,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AuthField {
    Email,
    Password,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthAction {
    Submit {
        mode: AuthMode,
        email: String,
        password: String,
    },
    Quit,
}

pub struct AuthFormState {
    pub mode: AuthMode,
    pub field: AuthField,
    pub email: String,
    pub password: String,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub busy: bool,
}

impl AuthFormState {
    pub fn new() -> Self {
        Self {
            mode: AuthMode::Login,
            field: AuthField::Email,
            email: String::new(),
            password: String::new(),
            error: None,
            notice: None,
            busy: false,
        }
    }

    /// Fresh form carrying the message that sent the user back here.
    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::new()
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::Login,
        };
        self.error = None;
        self.notice = None;
    }

    pub fn next_field(&mut self) {
        self.field = match self.field {
            AuthField::Email => AuthField::Password,
            AuthField::Password => AuthField::Email,
        };
    }

    /// Called after a successful sign-up; the user still has to log in.
    pub fn signed_up(&mut self) {
        self.busy = false;
        self.mode = AuthMode::Login;
        self.field = AuthField::Password;
        self.password.clear();
        self.error = None;
        self.notice = Some("Account created. Log in to continue.".to_string());
    }

    pub fn failed(&mut self, message: String) {
        self.busy = false;
        self.error = Some(message);
        self.notice = None;
    }

    fn current_mut(&mut self) -> &mut String {
        match self.field {
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }
}

impl Default for AuthFormState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_auth_form<B: Backend>(f: &mut Frame<B>, state: &AuthFormState) {
    let area = centered_rect(60, 60, f.size());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(2),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    let title = match state.mode {
        AuthMode::Login => "Log in",
        AuthMode::SignUp => "Create account",
    };
    let header = Paragraph::new(title)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title("Task Board"));
    f.render_widget(header, chunks[0]);

    let masked = "*".repeat(state.password.chars().count());
    for (field, label, value, chunk) in [
        (AuthField::Email, "Email", state.email.clone(), chunks[1]),
        (AuthField::Password, "Password", masked, chunks[2]),
    ] {
        let focused = state.field == field;
        let style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let text = if focused { format!("{value}|") } else { value };
        let input = Paragraph::new(text)
            .style(style)
            .block(Block::default().borders(Borders::ALL).title(label));
        f.render_widget(input, chunk);
    }

    let message = if state.busy {
        Spans::from(Span::styled("Please wait...", Style::default().fg(Color::Gray)))
    } else if let Some(error) = &state.error {
        Spans::from(Span::styled(error.clone(), Style::default().fg(Color::Red)))
    } else if let Some(notice) = &state.notice {
        Spans::from(Span::styled(notice.clone(), Style::default().fg(Color::Green)))
    } else {
        Spans::from("")
    };
    f.render_widget(Paragraph::new(message).alignment(Alignment::Center), chunks[3]);

    let switch = match state.mode {
        AuthMode::Login => "F2 - Create an account",
        AuthMode::SignUp => "F2 - Back to log in",
    };
    let help = Paragraph::new(format!("Tab - Switch field | Enter - Submit | {switch} | Esc - Quit"))
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[4]);
}

pub fn handle_key(state: &mut AuthFormState, key: KeyCode) -> Option<AuthAction> {
    if state.busy {
        return None;
    }

    match key {
        KeyCode::Esc => return Some(AuthAction::Quit),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => state.next_field(),
        KeyCode::F(2) => state.toggle_mode(),
        KeyCode::Enter => {
            state.busy = true;
            state.error = None;
            return Some(AuthAction::Submit {
                mode: state.mode,
                email: state.email.clone(),
                password: state.password.clone(),
            });
        }
        KeyCode::Char(c) => state.current_mut().push(c),
        KeyCode::Backspace => {
            state.current_mut().pop();
        }
        _ => {}
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(state: &mut AuthFormState, text: &str) {
        for c in text.chars() {
            handle_key(state, KeyCode::Char(c));
        }
    }

    #[test]
    fn enter_submits_both_fields() {
        let mut state = AuthFormState::new();
        type_text(&mut state, "ana@example.com");
        handle_key(&mut state, KeyCode::Tab);
        type_text(&mut state, "secret1");

        let action = handle_key(&mut state, KeyCode::Enter);
        assert_eq!(
            action,
            Some(AuthAction::Submit {
                mode: AuthMode::Login,
                email: "ana@example.com".into(),
                password: "secret1".into(),
            })
        );
        assert!(state.busy);
        assert_eq!(handle_key(&mut state, KeyCode::Enter), None);
    }

    #[test]
    fn sign_up_returns_to_login_with_notice() {
        let mut state = AuthFormState::new();
        handle_key(&mut state, KeyCode::F(2));
        assert_eq!(state.mode, AuthMode::SignUp);
        type_text(&mut state, "x");
        handle_key(&mut state, KeyCode::Enter);

        state.signed_up();
        assert_eq!(state.mode, AuthMode::Login);
        assert!(!state.busy);
        assert!(state.notice.is_some());
        assert!(state.password.is_empty());
    }
}
