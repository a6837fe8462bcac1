use chrono::{DateTime, Utc};
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};
use uuid::Uuid;

use crate::board::{is_overdue, Progress};
use crate::models::{Column, Role, TaskView};
use crate::service::board::BoardSnapshot;
use crate::ui::components::popup::{centered_rect, render_confirm};
use crate::ui::invite::{render_invite, InviteState};
use crate::ui::task_detail::{render_task_detail, TaskDetailState};

pub enum BoardMode {
    Browse,
    NewTask(String),
    ConfirmDelete(Uuid),
}

pub enum BoardModal {
    Detail(TaskDetailState),
    Invite(InviteState),
}

#[derive(Debug, PartialEq, Eq)]
pub enum BoardAction {
    Back,
    Reload,
    OpenTask(Uuid),
    AddTask { column: Column, title: String },
    DeleteTask(Uuid),
    MoveTask { task_id: Uuid, to: Column },
    Invite,
}

pub struct BoardState {
    pub project_id: Uuid,
    pub snapshot: Option<BoardSnapshot>,
    pub column: Column,
    cursors: [usize; 3],
    pub mode: BoardMode,
    pub modal: Option<BoardModal>,
}

impl BoardState {
    pub fn loading(project_id: Uuid) -> Self {
        Self {
            project_id,
            snapshot: None,
            column: Column::Todo,
            cursors: [0; 3],
            mode: BoardMode::Browse,
            modal: None,
        }
    }

    /// Installs a reloaded snapshot, keeping each column's cursor in range.
    pub fn set_snapshot(&mut self, snapshot: BoardSnapshot) {
        for column in Column::ALL {
            let len = snapshot.board.column(column).len();
            let cursor = &mut self.cursors[column.index()];
            *cursor = (*cursor).min(len.saturating_sub(1));
        }
        self.snapshot = Some(snapshot);
    }

    pub fn role(&self) -> Option<Role> {
        self.snapshot.as_ref().map(|s| s.role)
    }

    pub fn can_edit(&self) -> bool {
        self.role().is_some_and(Role::can_edit)
    }

    pub fn selected_task(&self) -> Option<&TaskView> {
        let snapshot = self.snapshot.as_ref()?;
        snapshot.board.column(self.column).get(self.cursors[self.column.index()])
    }

    fn move_cursor(&mut self, forward: bool) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let len = snapshot.board.column(self.column).len();
        let cursor = &mut self.cursors[self.column.index()];
        if forward {
            if *cursor + 1 < len {
                *cursor += 1;
            }
        } else {
            *cursor = cursor.saturating_sub(1);
        }
    }
}

fn card(view: &TaskView, now: DateTime<Utc>) -> ListItem<'static> {
    let progress = Progress::of(&view.checklist);
    let overdue = is_overdue(&view.checklist, now);

    let title_style = if overdue {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let mut title = vec![Span::styled(view.task.title.clone(), title_style)];
    if overdue {
        title.push(Span::styled(" !", Style::default().fg(Color::Red)));
    }

    let mut lines = vec![Spans::from(title)];
    if !progress.is_empty() {
        lines.push(Spans::from(format!("{} {}", progress.bar(10), progress.label())));
    }
    if !view.assignments.is_empty() {
        let initials: Vec<&str> = view.assignments.iter().map(|a| a.initials()).collect();
        lines.push(Spans::from(Span::styled(
            initials.join(" "),
            Style::default().fg(Color::Cyan),
        )));
    }
    lines.push(Spans::from(""));

    ListItem::new(lines)
}

pub fn render_board<B: Backend>(f: &mut Frame<B>, state: &mut BoardState, now: DateTime<Utc>) {
    let size = f.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(4), Constraint::Length(3)].as_ref())
        .split(size);

    let Some(snapshot) = &state.snapshot else {
        f.render_widget(
            Paragraph::new("Loading board...").block(Block::default().borders(Borders::ALL)),
            size,
        );
        return;
    };

    let badge_style = match snapshot.role {
        Role::Editor => Style::default().fg(Color::Black).bg(Color::Green),
        Role::Viewer => Style::default().fg(Color::Black).bg(Color::Gray),
    };
    let mut header = vec![
        Span::styled(snapshot.project.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(format!(" {} ", snapshot.role), badge_style),
        Span::raw("  Members: "),
    ];
    header.extend(snapshot.members.iter().map(|m| {
        Span::styled(format!("{} ", m.initials()), Style::default().fg(Color::Cyan))
    }));
    f.render_widget(
        Paragraph::new(Spans::from(header)).block(Block::default().borders(Borders::ALL).title("Board")),
        chunks[0],
    );

    let areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ]
            .as_ref(),
        )
        .split(chunks[1]);

    for column in Column::ALL {
        let tasks = snapshot.board.column(column);
        let focused = column == state.column;
        let items: Vec<ListItem> = tasks.iter().map(|view| card(view, now)).collect();
        let border = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(format!("{} ({})", column.title(), tasks.len())),
            )
            .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));

        let mut list_state = ListState::default();
        if focused && !tasks.is_empty() {
            list_state.select(Some(state.cursors[column.index()]));
        }
        f.render_stateful_widget(list, areas[column.index()], &mut list_state);
    }

    let mut footer = if snapshot.role.can_edit() {
        "Arrows - Navigate | Enter - Open | A - Add | D - Delete | </> - Move | I - Invite | R - Reload | Esc - Back"
            .to_string()
    } else {
        "Read only | Arrows - Navigate | Enter - Open | R - Reload | Esc - Back".to_string()
    };
    let unplaced = snapshot.board.unplaced().len();
    if unplaced > 0 {
        footer.push_str(&format!(" | {unplaced} task(s) in unknown columns"));
    }
    f.render_widget(
        Paragraph::new(footer)
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL)),
        chunks[2],
    );

    match &state.mode {
        BoardMode::Browse => {}
        BoardMode::NewTask(title) => render_new_task(f, state.column, title, size),
        BoardMode::ConfirmDelete(_) => render_confirm(f, "Delete task", "Delete this task and its checklist?"),
    }

    match &mut state.modal {
        Some(BoardModal::Detail(detail)) => render_task_detail(f, detail, now),
        Some(BoardModal::Invite(invite)) => render_invite(f, invite),
        None => {}
    }
}

fn render_new_task<B: Backend>(f: &mut Frame<B>, column: Column, title: &str, size: Rect) {
    let area = centered_rect(50, 20, size);
    f.render_widget(Clear, area);
    let input = Paragraph::new(vec![
        Spans::from(format!("{title}|")),
        Spans::from(""),
        Spans::from(Span::styled("Enter - Add | Esc - Cancel", Style::default().fg(Color::Gray))),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("New task in {}", column.title())),
    );
    f.render_widget(input, area);
}

/// Board keys when no modal is open.
pub fn handle_key(state: &mut BoardState, key: KeyCode) -> Option<BoardAction> {
    match &mut state.mode {
        BoardMode::NewTask(title) => {
            match key {
                KeyCode::Esc => state.mode = BoardMode::Browse,
                KeyCode::Enter => {
                    if title.trim().is_empty() {
                        return None;
                    }
                    let action = BoardAction::AddTask {
                        column: state.column,
                        title: title.clone(),
                    };
                    state.mode = BoardMode::Browse;
                    return Some(action);
                }
                KeyCode::Char(c) => title.push(c),
                KeyCode::Backspace => {
                    title.pop();
                }
                _ => {}
            }
            return None;
        }
        BoardMode::ConfirmDelete(task_id) => {
            let task_id = *task_id;
            state.mode = BoardMode::Browse;
            return match key {
                KeyCode::Char('y') => Some(BoardAction::DeleteTask(task_id)),
                _ => None,
            };
        }
        BoardMode::Browse => {}
    }

    match key {
        KeyCode::Esc | KeyCode::Char('q') => return Some(BoardAction::Back),
        KeyCode::Char('r') => return Some(BoardAction::Reload),
        KeyCode::Left | KeyCode::Char('h') => {
            if let Some(column) = state.column.previous() {
                state.column = column;
            }
        }
        KeyCode::Right | KeyCode::Char('l') => {
            if let Some(column) = state.column.next() {
                state.column = column;
            }
        }
        KeyCode::Down | KeyCode::Char('j') => state.move_cursor(true),
        KeyCode::Up | KeyCode::Char('k') => state.move_cursor(false),
        KeyCode::Enter => return state.selected_task().map(|v| BoardAction::OpenTask(v.task.id)),
        _ if !state.can_edit() => {}
        KeyCode::Char('a') => state.mode = BoardMode::NewTask(String::new()),
        KeyCode::Char('i') => return Some(BoardAction::Invite),
        KeyCode::Char('d') => {
            if let Some(task_id) = state.selected_task().map(|v| v.task.id) {
                state.mode = BoardMode::ConfirmDelete(task_id);
            }
        }
        KeyCode::Char('<') | KeyCode::Char('>') => {
            let destination = if key == KeyCode::Char('<') {
                state.column.previous()
            } else {
                state.column.next()
            };
            let task_id = state.selected_task().map(|v| v.task.id);
            if let (Some(task_id), Some(to)) = (task_id, destination) {
                return Some(BoardAction::MoveTask { task_id, to });
            }
        }
        _ => {}
    }
    None
}
