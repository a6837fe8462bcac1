use chrono::{DateTime, Local, Utc};
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

use crate::board::{item_is_overdue, Progress};
use crate::models::ChecklistItem;
use crate::service::task_detail::TaskDetail;
use crate::ui::components::datetime_input::DateTimeInputState;
use crate::ui::components::popup::{centered_rect, step};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DetailPane {
    Checklist,
    Assignees,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NewItemField {
    Title,
    Due,
}

pub enum DetailMode {
    Browse,
    NewItem {
        title: String,
        due: DateTimeInputState,
        field: NewItemField,
    },
    PickUser(ListState),
}

#[derive(Debug, PartialEq)]
pub enum TaskDetailAction {
    Close,
    Toggle(ChecklistItem),
    AddItem {
        title: String,
        due_date: Option<DateTime<Utc>>,
    },
    DeleteItem(Uuid),
    Assign(Uuid),
    Unassign(Uuid),
}

pub struct TaskDetailState {
    pub task_id: Uuid,
    pub detail: Option<TaskDetail>,
    pub can_edit: bool,
    pub pane: DetailPane,
    pub mode: DetailMode,
    checklist_state: ListState,
    assignee_state: ListState,
}

impl TaskDetailState {
    pub fn loading(task_id: Uuid, can_edit: bool) -> Self {
        Self {
            task_id,
            detail: None,
            can_edit,
            pane: DetailPane::Checklist,
            mode: DetailMode::Browse,
            checklist_state: ListState::default(),
            assignee_state: ListState::default(),
        }
    }

    /// Installs freshly loaded data, keeping cursors in range.
    pub fn set_detail(&mut self, detail: TaskDetail) {
        clamp(&mut self.checklist_state, detail.checklist.len());
        clamp(&mut self.assignee_state, detail.assignments.len());
        self.detail = Some(detail);
        self.mode = DetailMode::Browse;
    }

    fn selected_item(&self) -> Option<&ChecklistItem> {
        self.detail.as_ref()?.checklist.get(self.checklist_state.selected()?)
    }

    fn selected_assignment(&self) -> Option<Uuid> {
        let detail = self.detail.as_ref()?;
        detail
            .assignments
            .get(self.assignee_state.selected()?)
            .map(|a| a.assignment.id)
    }

    fn move_cursor(&mut self, forward: bool) {
        let Some(detail) = &self.detail else {
            return;
        };
        let (state, len) = match self.pane {
            DetailPane::Checklist => (&mut self.checklist_state, detail.checklist.len()),
            DetailPane::Assignees => (&mut self.assignee_state, detail.assignments.len()),
        };
        let selected = step(state.selected(), len, forward);
        state.select(selected);
    }
}

fn clamp(state: &mut ListState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        _ => {}
    }
}

fn format_due(due: DateTime<Utc>) -> String {
    due.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn checklist_item(item: &ChecklistItem, now: DateTime<Utc>) -> ListItem<'static> {
    let mark = if item.is_completed { "[x] " } else { "[ ] " };
    let title_style = if item.is_completed {
        Style::default().fg(Color::Gray).add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };
    let mut spans = vec![Span::raw(mark), Span::styled(item.title.clone(), title_style)];
    if let Some(due) = item.due_date {
        let style = if item_is_overdue(item, now) {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!("  due {}", format_due(due)), style));
    }
    ListItem::new(Spans::from(spans))
}

pub fn render_task_detail<B: Backend>(f: &mut Frame<B>, state: &mut TaskDetailState, now: DateTime<Utc>) {
    let area = centered_rect(80, 80, f.size());
    f.render_widget(Clear, area);

    let Some(detail) = &state.detail else {
        let loading = Paragraph::new("Loading task...").block(Block::default().title("Task").borders(Borders::ALL));
        f.render_widget(loading, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(4), Constraint::Length(3)].as_ref())
        .split(area);

    let progress = Progress::of(&detail.checklist);
    let column = detail
        .task
        .column()
        .map_or_else(|| detail.task.column_id.clone(), |c| c.title().to_string());
    let header = Paragraph::new(Spans::from(vec![
        Span::styled(detail.task.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("  ({column})  {} {}", progress.bar(10), progress.label())),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Task"));
    f.render_widget(header, chunks[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
        .split(chunks[1]);

    let focused = |pane: DetailPane| {
        if state.pane == pane {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        }
    };

    let items: Vec<ListItem> = detail.checklist.iter().map(|item| checklist_item(item, now)).collect();
    let checklist = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focused(DetailPane::Checklist))
                .title("Checklist"),
        )
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));
    f.render_stateful_widget(checklist, panes[0], &mut state.checklist_state);

    let assignees: Vec<ListItem> = detail
        .assignments
        .iter()
        .map(|a| ListItem::new(format!("[{}] {}", a.initials(), a.display_name())))
        .collect();
    let assignees = List::new(assignees)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focused(DetailPane::Assignees))
                .title("Assignees"),
        )
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));
    f.render_stateful_widget(assignees, panes[1], &mut state.assignee_state);

    let help = if !state.can_edit {
        "Read only | Tab - Switch pane | Esc - Close"
    } else {
        match state.pane {
            DetailPane::Checklist => "Space - Toggle | A - Add item | D - Delete item | Tab - Assignees | Esc - Close",
            DetailPane::Assignees => "A - Assign user | D - Unassign | Tab - Checklist | Esc - Close",
        }
    };
    f.render_widget(
        Paragraph::new(help)
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL)),
        chunks[2],
    );

    match &mut state.mode {
        DetailMode::Browse => {}
        DetailMode::NewItem { title, due, field } => render_new_item(f, title, due, *field),
        DetailMode::PickUser(list_state) => {
            let users: Vec<ListItem> = detail
                .available_users()
                .into_iter()
                .map(|u| ListItem::new(format!("[{}] {}  {}", u.initials, u.full_name, u.email)))
                .collect();
            let empty = users.is_empty();
            let area = centered_rect(50, 50, f.size());
            f.render_widget(Clear, area);
            if empty {
                f.render_widget(
                    Paragraph::new("Everyone is already assigned.")
                        .block(Block::default().borders(Borders::ALL).title("Assign user")),
                    area,
                );
            } else {
                let list = List::new(users)
                    .block(Block::default().borders(Borders::ALL).title("Assign user"))
                    .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));
                f.render_stateful_widget(list, area, list_state);
            }
        }
    }
}

fn render_new_item<B: Backend>(f: &mut Frame<B>, title: &str, due: &DateTimeInputState, field: NewItemField) {
    let area = centered_rect(60, 30, f.size());
    f.render_widget(Clear, area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(1)].as_ref())
        .split(area);

    let style = |current: bool| {
        if current {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        }
    };
    let title_text = if field == NewItemField::Title {
        format!("{title}|")
    } else {
        title.to_string()
    };
    f.render_widget(
        Paragraph::new(title_text)
            .style(style(field == NewItemField::Title))
            .block(Block::default().borders(Borders::ALL).title("New item")),
        rows[0],
    );
    f.render_widget(
        Paragraph::new(due.get_display_string(field == NewItemField::Due))
            .style(style(field == NewItemField::Due))
            .block(Block::default().borders(Borders::ALL).title("Due (optional)")),
        rows[1],
    );
    render_hint(f, rows[2], "Tab - Switch field | Left/Right - Date part | Del - Clear date | Enter - Add | Esc - Cancel");
}

fn render_hint<B: Backend>(f: &mut Frame<B>, area: Rect, text: &str) {
    f.render_widget(
        Paragraph::new(text.to_string()).style(Style::default().fg(Color::Gray).bg(Color::Black)),
        area,
    );
}

pub fn handle_key(state: &mut TaskDetailState, key: KeyCode) -> Option<TaskDetailAction> {
    match &mut state.mode {
        DetailMode::Browse => handle_browse(state, key),
        DetailMode::NewItem { title, due, field } => match key {
            KeyCode::Esc => {
                state.mode = DetailMode::Browse;
                None
            }
            KeyCode::Tab => {
                *field = match field {
                    NewItemField::Title => NewItemField::Due,
                    NewItemField::Due => NewItemField::Title,
                };
                None
            }
            KeyCode::Enter => {
                if title.trim().is_empty() {
                    return None;
                }
                let action = TaskDetailAction::AddItem {
                    title: title.clone(),
                    due_date: due.to_utc(),
                };
                state.mode = DetailMode::Browse;
                Some(action)
            }
            _ => {
                match field {
                    NewItemField::Title => match key {
                        KeyCode::Char(c) => title.push(c),
                        KeyCode::Backspace => {
                            title.pop();
                        }
                        _ => {}
                    },
                    NewItemField::Due => due.handle_input(key),
                }
                None
            }
        },
        DetailMode::PickUser(list_state) => {
            let available: Vec<Uuid> = state
                .detail
                .as_ref()
                .map(|d| d.available_users().iter().map(|u| u.user_id).collect())
                .unwrap_or_default();
            match key {
                KeyCode::Esc => state.mode = DetailMode::Browse,
                KeyCode::Down | KeyCode::Char('j') => {
                    let selected = step(list_state.selected(), available.len(), true);
                    list_state.select(selected);
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    let selected = step(list_state.selected(), available.len(), false);
                    list_state.select(selected);
                }
                KeyCode::Enter => {
                    let user = list_state.selected().and_then(|i| available.get(i).copied());
                    if let Some(user_id) = user {
                        state.mode = DetailMode::Browse;
                        return Some(TaskDetailAction::Assign(user_id));
                    }
                }
                _ => {}
            }
            None
        }
    }
}

fn handle_browse(state: &mut TaskDetailState, key: KeyCode) -> Option<TaskDetailAction> {
    match key {
        KeyCode::Esc | KeyCode::Char('q') => return Some(TaskDetailAction::Close),
        KeyCode::Tab => {
            state.pane = match state.pane {
                DetailPane::Checklist => DetailPane::Assignees,
                DetailPane::Assignees => DetailPane::Checklist,
            };
        }
        KeyCode::Down | KeyCode::Char('j') => state.move_cursor(true),
        KeyCode::Up | KeyCode::Char('k') => state.move_cursor(false),
        _ if !state.can_edit || state.detail.is_none() => {}
        KeyCode::Char(' ') | KeyCode::Enter if state.pane == DetailPane::Checklist => {
            return state.selected_item().cloned().map(TaskDetailAction::Toggle);
        }
        KeyCode::Char('a') => {
            state.mode = match state.pane {
                DetailPane::Checklist => DetailMode::NewItem {
                    title: String::new(),
                    due: DateTimeInputState::new(),
                    field: NewItemField::Title,
                },
                DetailPane::Assignees => {
                    let mut list_state = ListState::default();
                    list_state.select(Some(0));
                    DetailMode::PickUser(list_state)
                }
            };
        }
        KeyCode::Char('d') => {
            return match state.pane {
                DetailPane::Checklist => state.selected_item().map(|i| TaskDetailAction::DeleteItem(i.id)),
                DetailPane::Assignees => state.selected_assignment().map(TaskDetailAction::Unassign),
            };
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::{Task, UserProfile};

    fn detail(items: &[&str]) -> TaskDetail {
        let task_id = Uuid::new_v4();
        TaskDetail {
            task: Task {
                id: task_id,
                project_id: Uuid::new_v4(),
                title: "Ship".into(),
                column_id: "todo".into(),
                created_by: None,
                created_at: Utc::now(),
            },
            checklist: items
                .iter()
                .enumerate()
                .map(|(i, title)| ChecklistItem {
                    id: Uuid::new_v4(),
                    task_id,
                    title: title.to_string(),
                    due_date: None,
                    is_completed: false,
                    completed_at: None,
                    position: i as i32,
                })
                .collect(),
            assignments: vec![],
            users: vec![UserProfile::synthesize(Uuid::new_v4(), Some("bogdan@example.com"))],
        }
    }

    #[test]
    fn space_toggles_the_selected_item() {
        let mut state = TaskDetailState::loading(Uuid::new_v4(), true);
        state.set_detail(detail(&["one", "two"]));
        handle_key(&mut state, KeyCode::Down);

        match handle_key(&mut state, KeyCode::Char(' ')) {
            Some(TaskDetailAction::Toggle(item)) => assert_eq!(item.title, "two"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn viewers_only_browse() {
        let mut state = TaskDetailState::loading(Uuid::new_v4(), false);
        state.set_detail(detail(&["one"]));
        assert_eq!(handle_key(&mut state, KeyCode::Char(' ')), None);
        assert_eq!(handle_key(&mut state, KeyCode::Char('d')), None);
        handle_key(&mut state, KeyCode::Char('a'));
        assert!(matches!(state.mode, DetailMode::Browse));
        assert_eq!(handle_key(&mut state, KeyCode::Esc), Some(TaskDetailAction::Close));
    }

    #[test]
    fn new_item_form_submits_title_without_due_date() {
        let mut state = TaskDetailState::loading(Uuid::new_v4(), true);
        state.set_detail(detail(&[]));
        handle_key(&mut state, KeyCode::Char('a'));
        for c in "Draft".chars() {
            handle_key(&mut state, KeyCode::Char(c));
        }
        assert_eq!(
            handle_key(&mut state, KeyCode::Enter),
            Some(TaskDetailAction::AddItem {
                title: "Draft".into(),
                due_date: None,
            })
        );
        assert!(matches!(state.mode, DetailMode::Browse));
    }

    #[test]
    fn picker_assigns_an_available_user() {
        let mut state = TaskDetailState::loading(Uuid::new_v4(), true);
        let detail = detail(&[]);
        let user_id = detail.users[0].user_id;
        state.set_detail(detail);
        handle_key(&mut state, KeyCode::Tab);
        handle_key(&mut state, KeyCode::Char('a'));
        assert_eq!(handle_key(&mut state, KeyCode::Enter), Some(TaskDetailAction::Assign(user_id)));
    }
}
