use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};
use uuid::Uuid;

use crate::models::{Role, UserProfile};
use crate::ui::components::popup::{centered_rect, step};

pub struct InviteState {
    pub users: Option<Vec<UserProfile>>,
    pub role: Role,
    list_state: ListState,
}

#[derive(Debug, PartialEq, Eq)]
pub enum InviteAction {
    Cancel,
    Invite { user_id: Uuid, role: Role },
}

impl InviteState {
    pub fn loading() -> Self {
        Self {
            users: None,
            role: Role::Editor,
            list_state: ListState::default(),
        }
    }

    pub fn set_users(&mut self, users: Vec<UserProfile>) {
        self.list_state.select(if users.is_empty() { None } else { Some(0) });
        self.users = Some(users);
    }

    fn len(&self) -> usize {
        self.users.as_ref().map_or(0, Vec::len)
    }

    fn selected_user(&self) -> Option<&UserProfile> {
        self.users.as_ref()?.get(self.list_state.selected()?)
    }
}

pub fn render_invite<B: Backend>(f: &mut Frame<B>, state: &mut InviteState) {
    let area = centered_rect(60, 60, f.size());
    f.render_widget(Clear, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)].as_ref())
        .split(area);

    let block = Block::default().borders(Borders::ALL).title("Invite member");
    match &state.users {
        None => f.render_widget(Paragraph::new("Loading users...").block(block), chunks[0]),
        Some(users) if users.is_empty() => f.render_widget(
            Paragraph::new("Every user is already a member.")
                .style(Style::default().fg(Color::Gray))
                .block(block),
            chunks[0],
        ),
        Some(users) => {
            let items: Vec<ListItem> = users
                .iter()
                .map(|u| {
                    ListItem::new(Spans::from(vec![
                        Span::styled(format!("[{}] ", u.initials), Style::default().fg(Color::Cyan)),
                        Span::raw(u.full_name.clone()),
                        Span::styled(format!("  {}", u.email), Style::default().fg(Color::Gray)),
                    ]))
                })
                .collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));
            f.render_stateful_widget(list, chunks[0], &mut state.list_state);
        }
    }

    let footer = Paragraph::new(Spans::from(vec![
        Span::raw("Role: "),
        Span::styled(state.role.to_string(), Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::raw(" | <R> Toggle role | <Enter> Invite | <Esc> Cancel"),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[1]);
}

pub fn handle_key(state: &mut InviteState, key: KeyCode) -> Option<InviteAction> {
    match key {
        KeyCode::Esc => return Some(InviteAction::Cancel),
        KeyCode::Char('r') | KeyCode::Tab => state.role = state.role.toggled(),
        KeyCode::Down | KeyCode::Char('j') => {
            let selected = step(state.list_state.selected(), state.len(), true);
            state.list_state.select(selected);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            let selected = step(state.list_state.selected(), state.len(), false);
            state.list_state.select(selected);
        }
        KeyCode::Enter => {
            if let Some(user) = state.selected_user() {
                return Some(InviteAction::Invite {
                    user_id: user.user_id,
                    role: state.role,
                });
            }
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_editor_and_toggles() {
        let mut state = InviteState::loading();
        let user = UserProfile::synthesize(Uuid::new_v4(), Some("carmen@example.com"));
        let user_id = user.user_id;
        state.set_users(vec![user]);

        assert_eq!(
            handle_key(&mut state, KeyCode::Enter),
            Some(InviteAction::Invite {
                user_id,
                role: Role::Editor,
            })
        );
        handle_key(&mut state, KeyCode::Char('r'));
        assert_eq!(
            handle_key(&mut state, KeyCode::Enter),
            Some(InviteAction::Invite {
                user_id,
                role: Role::Viewer,
            })
        );
    }

    #[test]
    fn nothing_to_invite_while_loading() {
        let mut state = InviteState::loading();
        assert_eq!(handle_key(&mut state, KeyCode::Enter), None);
        assert_eq!(handle_key(&mut state, KeyCode::Esc), Some(InviteAction::Cancel));
    }
}
